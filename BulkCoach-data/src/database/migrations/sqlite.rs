use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_body_logs_table(conn)?;
    create_food_items_table(conn)?;
    create_diet_plan_tables(conn)?;
    create_coach_dismissals_table(conn)?;
    create_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the body logs table, one row per user and calendar day
fn create_body_logs_table(conn: &Connection) -> Result<(), String> {
    info!("Creating body_logs table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS body_logs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            weight_kg REAL NOT NULL,
            bio_body_fat_percent REAL,
            bio_muscle_mass_kg REAL,
            skinfold_chest REAL,
            skinfold_axillary REAL,
            skinfold_triceps REAL,
            skinfold_subscapular REAL,
            skinfold_suprailiac REAL,
            skinfold_abdominal REAL,
            skinfold_thigh REAL,
            circ_neck REAL,
            circ_shoulder REAL,
            circ_chest_relaxed REAL,
            circ_arm_relaxed_right REAL,
            circ_arm_relaxed_left REAL,
            circ_arm_contracted_right REAL,
            circ_arm_contracted_left REAL,
            circ_forearm_right REAL,
            circ_forearm_left REAL,
            circ_waist REAL,
            circ_abdomen REAL,
            circ_hips REAL,
            circ_thigh_proximal_right REAL,
            circ_thigh_proximal_left REAL,
            circ_calf_right REAL,
            circ_calf_left REAL,
            calculated_body_density REAL,
            calculated_body_fat_percent REAL,
            created_at TEXT NOT NULL,
            UNIQUE (user_id, date)
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the food catalogue table, nutrients per 100 g
fn create_food_items_table(conn: &Connection) -> Result<(), String> {
    info!("Creating food_items table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS food_items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            brand TEXT,
            calories_kcal REAL NOT NULL,
            protein_g REAL NOT NULL,
            carbs_g REAL NOT NULL,
            fat_g REAL NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the diet plan hierarchy: plan, variation, meal and meal item
fn create_diet_plan_tables(conn: &Connection) -> Result<(), String> {
    info!("Creating diet plan tables if not exist");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS diet_plans (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            target_calories REAL NOT NULL,
            target_protein REAL NOT NULL,
            target_carbs REAL NOT NULL,
            target_fat REAL NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS diet_variations (
            id TEXT PRIMARY KEY,
            diet_plan_id TEXT NOT NULL REFERENCES diet_plans (id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            order_index INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS meals (
            id TEXT PRIMARY KEY,
            variation_id TEXT NOT NULL REFERENCES diet_variations (id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            order_index INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS meal_items (
            id TEXT PRIMARY KEY,
            meal_id TEXT NOT NULL REFERENCES meals (id) ON DELETE CASCADE,
            food_item_id TEXT NOT NULL REFERENCES food_items (id) ON DELETE CASCADE,
            quantity_grams REAL NOT NULL,
            order_index INTEGER NOT NULL
        );",
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the coach dismissal table, one anchor per user
fn create_coach_dismissals_table(conn: &Connection) -> Result<(), String> {
    info!("Creating coach_dismissals table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS coach_dismissals (
            user_id TEXT PRIMARY KEY,
            w_curr REAL NOT NULL,
            w_prev REAL NOT NULL,
            applied INTEGER NOT NULL,
            recorded_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create indexes for the per-user lookups
fn create_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating indexes");

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_body_logs_user_date ON body_logs (user_id, date DESC);
        CREATE INDEX IF NOT EXISTS idx_diet_plans_user_active ON diet_plans (user_id, is_active);
        CREATE INDEX IF NOT EXISTS idx_food_items_name ON food_items (name);",
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
