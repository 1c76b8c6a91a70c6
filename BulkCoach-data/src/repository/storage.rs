use chrono::{DateTime, NaiveDate, Utc};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, TransactionBehavior};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::body_log::{BodyLog, Circumferences, CreateBodyLogRequest, Skinfolds};
use crate::models::diet_plan::{
    adjusted_targets, AdjustmentOutcome, CoachAdjustment, DietPlan, DietVariation, Meal, MealItem, TargetUpdate,
};
use crate::models::dismissal::CoachDismissal;
use crate::models::food::FoodItem;
use super::errors::{map_constraint, RepositoryError};

/// Column order shared by the body log insert, update and select statements
const BODY_LOG_COLUMNS: [&str; 32] = [
    "id",
    "user_id",
    "date",
    "weight_kg",
    "bio_body_fat_percent",
    "bio_muscle_mass_kg",
    "skinfold_chest",
    "skinfold_axillary",
    "skinfold_triceps",
    "skinfold_subscapular",
    "skinfold_suprailiac",
    "skinfold_abdominal",
    "skinfold_thigh",
    "circ_neck",
    "circ_shoulder",
    "circ_chest_relaxed",
    "circ_arm_relaxed_right",
    "circ_arm_relaxed_left",
    "circ_arm_contracted_right",
    "circ_arm_contracted_left",
    "circ_forearm_right",
    "circ_forearm_left",
    "circ_waist",
    "circ_abdomen",
    "circ_hips",
    "circ_thigh_proximal_right",
    "circ_thigh_proximal_left",
    "circ_calf_right",
    "circ_calf_left",
    "calculated_body_density",
    "calculated_body_fat_percent",
    "created_at",
];

const FOOD_COLUMNS: &str = "id, name, brand, calories_kcal, protein_g, carbs_g, fat_g, created_at";

const PLAN_COLUMNS: &str =
    "id, user_id, target_calories, target_protein, target_carbs, target_fat, is_active, created_at";

/// Database storage operations for every table of the application
pub struct DatabaseStorage;

fn connection(pool: &DatabasePool) -> Result<PooledConnection<SqliteConnectionManager>, RepositoryError> {
    match pool {
        DatabasePool::SQLite(pool) => pool.get().map_err(RepositoryError::Pool),
    }
}

fn body_log_select() -> String {
    format!("SELECT {} FROM body_logs", BODY_LOG_COLUMNS.join(", "))
}

fn body_log_params(log: &BodyLog) -> Vec<&dyn ToSql> {
    let s = &log.skinfolds;
    let c = &log.circumferences;
    vec![
        &log.id,
        &log.user_id,
        &log.date,
        &log.weight_kg,
        &log.bio_body_fat_percent,
        &log.bio_muscle_mass_kg,
        &s.chest,
        &s.axillary,
        &s.triceps,
        &s.subscapular,
        &s.suprailiac,
        &s.abdominal,
        &s.thigh,
        &c.neck,
        &c.shoulder,
        &c.chest_relaxed,
        &c.arm_relaxed_right,
        &c.arm_relaxed_left,
        &c.arm_contracted_right,
        &c.arm_contracted_left,
        &c.forearm_right,
        &c.forearm_left,
        &c.waist,
        &c.abdomen,
        &c.hips,
        &c.thigh_proximal_right,
        &c.thigh_proximal_left,
        &c.calf_right,
        &c.calf_left,
        &log.calculated_body_density,
        &log.calculated_body_fat_percent,
        &log.created_at,
    ]
}

fn body_log_from_row(row: &Row<'_>) -> rusqlite::Result<BodyLog> {
    Ok(BodyLog {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        date: row.get("date")?,
        weight_kg: row.get("weight_kg")?,
        bio_body_fat_percent: row.get("bio_body_fat_percent")?,
        bio_muscle_mass_kg: row.get("bio_muscle_mass_kg")?,
        skinfolds: Skinfolds {
            chest: row.get("skinfold_chest")?,
            axillary: row.get("skinfold_axillary")?,
            triceps: row.get("skinfold_triceps")?,
            subscapular: row.get("skinfold_subscapular")?,
            suprailiac: row.get("skinfold_suprailiac")?,
            abdominal: row.get("skinfold_abdominal")?,
            thigh: row.get("skinfold_thigh")?,
        },
        circumferences: Circumferences {
            neck: row.get("circ_neck")?,
            shoulder: row.get("circ_shoulder")?,
            chest_relaxed: row.get("circ_chest_relaxed")?,
            arm_relaxed_right: row.get("circ_arm_relaxed_right")?,
            arm_relaxed_left: row.get("circ_arm_relaxed_left")?,
            arm_contracted_right: row.get("circ_arm_contracted_right")?,
            arm_contracted_left: row.get("circ_arm_contracted_left")?,
            forearm_right: row.get("circ_forearm_right")?,
            forearm_left: row.get("circ_forearm_left")?,
            waist: row.get("circ_waist")?,
            abdomen: row.get("circ_abdomen")?,
            hips: row.get("circ_hips")?,
            thigh_proximal_right: row.get("circ_thigh_proximal_right")?,
            thigh_proximal_left: row.get("circ_thigh_proximal_left")?,
            calf_right: row.get("circ_calf_right")?,
            calf_left: row.get("circ_calf_left")?,
        },
        calculated_body_density: row.get("calculated_body_density")?,
        calculated_body_fat_percent: row.get("calculated_body_fat_percent")?,
        created_at: row.get("created_at")?,
    })
}

fn food_from_row(row: &Row<'_>) -> rusqlite::Result<FoodItem> {
    Ok(FoodItem {
        id: row.get("id")?,
        name: row.get("name")?,
        brand: row.get("brand")?,
        calories_kcal: row.get("calories_kcal")?,
        protein_g: row.get("protein_g")?,
        carbs_g: row.get("carbs_g")?,
        fat_g: row.get("fat_g")?,
        created_at: row.get("created_at")?,
    })
}

/// Plan header only, variations are filled in by [`load_variations`]
fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<DietPlan> {
    Ok(DietPlan {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        target_calories: row.get("target_calories")?,
        target_protein: row.get("target_protein")?,
        target_carbs: row.get("target_carbs")?,
        target_fat: row.get("target_fat")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        variations: Vec::new(),
    })
}

fn dismissal_from_row(row: &Row<'_>) -> rusqlite::Result<CoachDismissal> {
    Ok(CoachDismissal {
        user_id: row.get("user_id")?,
        w_curr: row.get("w_curr")?,
        w_prev: row.get("w_prev")?,
        applied: row.get("applied")?,
        recorded_at: row.get("recorded_at")?,
    })
}

fn select_body_log(conn: &Connection, user_id: &str, date: NaiveDate) -> Result<Option<BodyLog>, RepositoryError> {
    let sql = format!("{} WHERE user_id = ?1 AND date = ?2", body_log_select());
    Ok(conn.query_row(&sql, params![user_id, date], body_log_from_row).optional()?)
}

const MEAL_ITEM_SELECT: &str =
    "SELECT mi.id AS item_id, mi.quantity_grams,
            f.id, f.name, f.brand, f.calories_kcal, f.protein_g, f.carbs_g, f.fat_g, f.created_at
     FROM meal_items mi
     JOIN food_items f ON f.id = mi.food_item_id";

fn meal_item_from_row(row: &Row<'_>) -> rusqlite::Result<MealItem> {
    Ok(MealItem {
        id: row.get("item_id")?,
        quantity_grams: row.get("quantity_grams")?,
        food: food_from_row(row)?,
    })
}

fn select_meal_items(conn: &Connection, meal_id: &str) -> Result<Vec<MealItem>, RepositoryError> {
    let mut stmt = conn.prepare_cached(&format!("{} WHERE mi.meal_id = ?1 ORDER BY mi.order_index", MEAL_ITEM_SELECT))?;
    let items = stmt
        .query_map([meal_id], meal_item_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

fn select_meal_item(conn: &Connection, item_id: &str) -> Result<Option<MealItem>, RepositoryError> {
    let sql = format!("{} WHERE mi.id = ?1", MEAL_ITEM_SELECT);
    Ok(conn.query_row(&sql, [item_id], meal_item_from_row).optional()?)
}

fn select_meal(conn: &Connection, meal_id: &str) -> Result<Option<Meal>, RepositoryError> {
    let name = conn
        .query_row("SELECT name FROM meals WHERE id = ?1", [meal_id], |row| row.get::<_, String>(0))
        .optional()?;

    match name {
        Some(name) => Ok(Some(Meal {
            id: meal_id.to_string(),
            name,
            items: select_meal_items(conn, meal_id)?,
        })),
        None => Ok(None),
    }
}

fn load_variations(conn: &Connection, plan: &mut DietPlan) -> Result<(), RepositoryError> {
    let mut variation_stmt = conn.prepare(
        "SELECT id, name FROM diet_variations WHERE diet_plan_id = ?1 ORDER BY order_index",
    )?;
    let mut meal_stmt = conn.prepare(
        "SELECT id, name FROM meals WHERE variation_id = ?1 ORDER BY order_index",
    )?;

    let variations = variation_stmt
        .query_map([&plan.id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    plan.variations.clear();
    for (variation_id, variation_name) in variations {
        let meals = meal_stmt
            .query_map([&variation_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut loaded_meals = Vec::with_capacity(meals.len());
        for (meal_id, meal_name) in meals {
            let items = select_meal_items(conn, &meal_id)?;
            loaded_meals.push(Meal { id: meal_id, name: meal_name, items });
        }

        plan.variations.push(DietVariation {
            id: variation_id,
            name: variation_name,
            meals: loaded_meals,
        });
    }

    Ok(())
}

fn select_active_plan(conn: &Connection, user_id: &str) -> Result<Option<DietPlan>, RepositoryError> {
    let sql = format!(
        "SELECT {} FROM diet_plans WHERE user_id = ?1 AND is_active = 1 ORDER BY created_at DESC LIMIT 1",
        PLAN_COLUMNS
    );
    let plan = conn.query_row(&sql, [user_id], plan_from_row).optional()?;

    match plan {
        Some(mut plan) => {
            load_variations(conn, &mut plan)?;
            Ok(Some(plan))
        }
        None => Ok(None),
    }
}

fn select_plan_by_id(conn: &Connection, plan_id: &str) -> Result<Option<DietPlan>, RepositoryError> {
    let sql = format!("SELECT {} FROM diet_plans WHERE id = ?1", PLAN_COLUMNS);
    let plan = conn.query_row(&sql, [plan_id], plan_from_row).optional()?;

    match plan {
        Some(mut plan) => {
            load_variations(conn, &mut plan)?;
            Ok(Some(plan))
        }
        None => Ok(None),
    }
}

fn write_targets(conn: &Connection, plan: &mut DietPlan, calorie_delta: f64, carb_delta: f64) -> Result<(), RepositoryError> {
    let (calories, carbs) = adjusted_targets(plan, calorie_delta, carb_delta)
        .map_err(RepositoryError::Validation)?;

    conn.execute(
        "UPDATE diet_plans SET target_calories = ?1, target_carbs = ?2 WHERE id = ?3",
        params![calories, carbs, &plan.id],
    )?;

    plan.target_calories = calories;
    plan.target_carbs = carbs;
    Ok(())
}

fn upsert_dismissal(conn: &Connection, dismissal: &CoachDismissal) -> Result<(), RepositoryError> {
    conn.execute(
        "INSERT INTO coach_dismissals (user_id, w_curr, w_prev, applied, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id) DO UPDATE SET
            w_curr = excluded.w_curr,
            w_prev = excluded.w_prev,
            applied = excluded.applied,
            recorded_at = excluded.recorded_at",
        params![
            &dismissal.user_id,
            dismissal.w_curr,
            dismissal.w_prev,
            dismissal.applied,
            &dismissal.recorded_at,
        ],
    )?;
    Ok(())
}

impl DatabaseStorage {
    /// Store a new body log, a second log on the same day is a conflict
    pub async fn insert_body_log(pool: &DatabasePool, log: &BodyLog) -> Result<(), RepositoryError> {
        debug!("Storing body log in database: user={}, date={}", log.user_id, log.date);

        let conn = connection(pool)?;
        let placeholders = (1..=BODY_LOG_COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO body_logs ({}) VALUES ({})",
            BODY_LOG_COLUMNS.join(", "),
            placeholders
        );

        conn.execute(&sql, body_log_params(log).as_slice())
            .map_err(|e| map_constraint(e, || format!("a body log already exists for {}", log.date)))?;

        Ok(())
    }

    /// Replace every measurement of the log stored for (user, date)
    pub async fn replace_body_log(
        pool: &DatabasePool,
        user_id: &str,
        date: NaiveDate,
        request: CreateBodyLogRequest,
    ) -> Result<BodyLog, RepositoryError> {
        debug!("Replacing body log in database: user={}, date={}", user_id, date);

        let mut conn = connection(pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = select_body_log(&tx, user_id, date)?
            .ok_or_else(|| RepositoryError::NotFound(format!("no body log for {}", date)))?;
        let updated = BodyLog::from_request(existing.id, request, existing.created_at);

        let assignments = BODY_LOG_COLUMNS.iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE body_logs SET {} WHERE id = ?1", assignments);

        tx.execute(&sql, body_log_params(&updated).as_slice())
            .map_err(|e| map_constraint(e, || format!("a body log already exists for {}", updated.date)))?;
        tx.commit()?;

        Ok(updated)
    }

    pub async fn delete_body_log(pool: &DatabasePool, user_id: &str, date: NaiveDate) -> Result<bool, RepositoryError> {
        debug!("Deleting body log from database: user={}, date={}", user_id, date);

        let conn = connection(pool)?;
        let deleted = conn.execute(
            "DELETE FROM body_logs WHERE user_id = ?1 AND date = ?2",
            params![user_id, date],
        )?;
        Ok(deleted > 0)
    }

    pub async fn get_body_log(pool: &DatabasePool, user_id: &str, date: NaiveDate) -> Result<Option<BodyLog>, RepositoryError> {
        let conn = connection(pool)?;
        select_body_log(&conn, user_id, date)
    }

    /// Logs between two dates inclusive, oldest first
    pub async fn list_body_logs_between(
        pool: &DatabasePool,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BodyLog>, RepositoryError> {
        let conn = connection(pool)?;
        let sql = format!(
            "{} WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date ASC",
            body_log_select()
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt.query_map(params![user_id, from, to], body_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// All logs of a user, newest first
    pub async fn list_body_logs(pool: &DatabasePool, user_id: &str) -> Result<Vec<BodyLog>, RepositoryError> {
        let conn = connection(pool)?;
        let sql = format!("{} WHERE user_id = ?1 ORDER BY date DESC", body_log_select());
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt.query_map([user_id], body_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    pub async fn insert_food(pool: &DatabasePool, food: &FoodItem) -> Result<(), RepositoryError> {
        debug!("Storing food item in database: id={}", food.id);

        let conn = connection(pool)?;
        conn.execute(
            &format!("INSERT INTO food_items ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", FOOD_COLUMNS),
            params![
                &food.id,
                &food.name,
                &food.brand,
                food.calories_kcal,
                food.protein_g,
                food.carbs_g,
                food.fat_g,
                &food.created_at,
            ],
        )?;
        Ok(())
    }

    pub async fn get_food(pool: &DatabasePool, id: &str) -> Result<Option<FoodItem>, RepositoryError> {
        let conn = connection(pool)?;
        let sql = format!("SELECT {} FROM food_items WHERE id = ?1", FOOD_COLUMNS);
        Ok(conn.query_row(&sql, [id], food_from_row).optional()?)
    }

    /// Foods ordered by name, optionally filtered by a case-insensitive name fragment
    pub async fn list_foods(pool: &DatabasePool, search: Option<&str>) -> Result<Vec<FoodItem>, RepositoryError> {
        let conn = connection(pool)?;
        let foods = match search {
            Some(search) => {
                let sql = format!(
                    "SELECT {} FROM food_items WHERE lower(name) LIKE '%' || lower(?1) || '%' ORDER BY name, id",
                    FOOD_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([search], food_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!("SELECT {} FROM food_items ORDER BY name, id", FOOD_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], food_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(foods)
    }

    /// Remove a food, meal items referencing it cascade
    pub async fn delete_food(pool: &DatabasePool, id: &str) -> Result<bool, RepositoryError> {
        debug!("Deleting food item from database: id={}", id);

        let conn = connection(pool)?;
        let deleted = conn.execute("DELETE FROM food_items WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    /// Store a new active plan with its whole hierarchy, deactivating the previous plans of the user
    pub async fn insert_plan(pool: &DatabasePool, plan: &DietPlan) -> Result<(), RepositoryError> {
        debug!("Storing diet plan in database: id={}, user={}", plan.id, plan.user_id);

        let mut conn = connection(pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("UPDATE diet_plans SET is_active = 0 WHERE user_id = ?1", [&plan.user_id])?;
        tx.execute(
            &format!("INSERT INTO diet_plans ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", PLAN_COLUMNS),
            params![
                &plan.id,
                &plan.user_id,
                plan.target_calories,
                plan.target_protein,
                plan.target_carbs,
                plan.target_fat,
                plan.is_active,
                &plan.created_at,
            ],
        )?;

        for (variation_index, variation) in plan.variations.iter().enumerate() {
            tx.execute(
                "INSERT INTO diet_variations (id, diet_plan_id, name, order_index) VALUES (?1, ?2, ?3, ?4)",
                params![&variation.id, &plan.id, &variation.name, variation_index as i64],
            )?;

            for (meal_index, meal) in variation.meals.iter().enumerate() {
                tx.execute(
                    "INSERT INTO meals (id, variation_id, name, order_index) VALUES (?1, ?2, ?3, ?4)",
                    params![&meal.id, &variation.id, &meal.name, meal_index as i64],
                )?;

                for (item_index, item) in meal.items.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO meal_items (id, meal_id, food_item_id, quantity_grams, order_index)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![&item.id, &meal.id, &item.food.id, item.quantity_grams, item_index as i64],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub async fn get_active_plan(pool: &DatabasePool, user_id: &str) -> Result<Option<DietPlan>, RepositoryError> {
        let conn = connection(pool)?;
        select_active_plan(&conn, user_id)
    }

    /// Overwrite the set targets of a plan
    pub async fn update_plan_targets(
        pool: &DatabasePool,
        plan_id: &str,
        update: TargetUpdate,
    ) -> Result<DietPlan, RepositoryError> {
        debug!("Updating diet plan targets in database: id={}", plan_id);

        let mut conn = connection(pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut plan = select_plan_by_id(&tx, plan_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("diet plan {}", plan_id)))?;
        update.apply_to(&mut plan).map_err(RepositoryError::Validation)?;

        tx.execute(
            "UPDATE diet_plans
             SET target_calories = ?1, target_protein = ?2, target_carbs = ?3, target_fat = ?4
             WHERE id = ?5",
            params![plan.target_calories, plan.target_protein, plan.target_carbs, plan.target_fat, &plan.id],
        )?;

        tx.commit()?;
        Ok(plan)
    }

    /// Append an empty meal to a variation of the plan, or to its first variation
    pub async fn insert_meal(
        pool: &DatabasePool,
        plan_id: &str,
        variation_id: Option<&str>,
        meal: &Meal,
    ) -> Result<(), RepositoryError> {
        debug!("Storing meal in database: plan={}, meal={}", plan_id, meal.id);

        let mut conn = connection(pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let plan_exists = tx
            .query_row("SELECT 1 FROM diet_plans WHERE id = ?1", [plan_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !plan_exists {
            return Err(RepositoryError::NotFound(format!("diet plan {}", plan_id)));
        }

        let variation = match variation_id {
            Some(id) => tx.query_row(
                "SELECT id FROM diet_variations WHERE id = ?1 AND diet_plan_id = ?2",
                params![id, plan_id],
                |row| row.get::<_, String>(0),
            ),
            None => tx.query_row(
                "SELECT id FROM diet_variations WHERE diet_plan_id = ?1 ORDER BY order_index LIMIT 1",
                [plan_id],
                |row| row.get::<_, String>(0),
            ),
        }
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound(format!("variation of diet plan {}", plan_id)))?;

        tx.execute(
            "INSERT INTO meals (id, variation_id, name, order_index)
             VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(order_index) + 1, 0) FROM meals WHERE variation_id = ?2))",
            params![&meal.id, &variation, &meal.name],
        )?;

        tx.commit()?;
        Ok(())
    }

    pub async fn rename_meal(pool: &DatabasePool, meal_id: &str, name: &str) -> Result<Meal, RepositoryError> {
        debug!("Renaming meal in database: id={}", meal_id);

        let conn = connection(pool)?;
        let updated = conn.execute("UPDATE meals SET name = ?1 WHERE id = ?2", params![name, meal_id])?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("meal {}", meal_id)));
        }

        select_meal(&conn, meal_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("meal {}", meal_id)))
    }

    /// Delete a meal, its items go with it
    pub async fn delete_meal(pool: &DatabasePool, meal_id: &str) -> Result<bool, RepositoryError> {
        debug!("Deleting meal from database: id={}", meal_id);

        let conn = connection(pool)?;
        let deleted = conn.execute("DELETE FROM meals WHERE id = ?1", [meal_id])?;
        Ok(deleted > 0)
    }

    /// Append an item to the end of a meal
    pub async fn insert_meal_item(pool: &DatabasePool, meal_id: &str, item: &MealItem) -> Result<(), RepositoryError> {
        debug!("Storing meal item in database: meal={}, food={}", meal_id, item.food.id);

        let conn = connection(pool)?;
        let meal_exists = conn
            .query_row("SELECT 1 FROM meals WHERE id = ?1", [meal_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !meal_exists {
            return Err(RepositoryError::NotFound(format!("meal {}", meal_id)));
        }

        conn.execute(
            "INSERT INTO meal_items (id, meal_id, food_item_id, quantity_grams, order_index)
             VALUES (?1, ?2, ?3, ?4, (SELECT COALESCE(MAX(order_index) + 1, 0) FROM meal_items WHERE meal_id = ?2))",
            params![&item.id, meal_id, &item.food.id, item.quantity_grams],
        )?;
        Ok(())
    }

    pub async fn update_meal_item(pool: &DatabasePool, item_id: &str, quantity_grams: f64) -> Result<MealItem, RepositoryError> {
        debug!("Updating meal item in database: id={}, quantity={}", item_id, quantity_grams);

        let conn = connection(pool)?;
        let updated = conn.execute(
            "UPDATE meal_items SET quantity_grams = ?1 WHERE id = ?2",
            params![quantity_grams, item_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("meal item {}", item_id)));
        }

        select_meal_item(&conn, item_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("meal item {}", item_id)))
    }

    pub async fn delete_meal_item(pool: &DatabasePool, item_id: &str) -> Result<bool, RepositoryError> {
        debug!("Deleting meal item from database: id={}", item_id);

        let conn = connection(pool)?;
        let deleted = conn.execute("DELETE FROM meal_items WHERE id = ?1", [item_id])?;
        Ok(deleted > 0)
    }

    /// Update the active plan and record the anchor as applied in one immediate transaction
    pub async fn apply_coach_adjustment(
        pool: &DatabasePool,
        user_id: &str,
        adjustment: CoachAdjustment,
        recorded_at: DateTime<Utc>,
    ) -> Result<AdjustmentOutcome, RepositoryError> {
        debug!("Applying coach adjustment in database: user={}", user_id);

        let mut conn = connection(pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut plan = select_active_plan(&tx, user_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("no active diet plan for user {}", user_id)))?;

        let existing = tx.query_row(
            "SELECT user_id, w_curr, w_prev, applied, recorded_at FROM coach_dismissals WHERE user_id = ?1",
            [user_id],
            dismissal_from_row,
        ).optional()?;

        if let Some(existing) = existing {
            if existing.applied && existing.matches(adjustment.w_curr, adjustment.w_prev) {
                return Ok(AdjustmentOutcome::AlreadyApplied(plan));
            }
        }

        write_targets(&tx, &mut plan, adjustment.calorie_delta, adjustment.carb_delta)?;
        upsert_dismissal(&tx, &CoachDismissal {
            user_id: user_id.to_string(),
            w_curr: adjustment.w_curr,
            w_prev: adjustment.w_prev,
            applied: true,
            recorded_at,
        })?;

        tx.commit()?;
        Ok(AdjustmentOutcome::Applied(plan))
    }

    pub async fn get_dismissal(pool: &DatabasePool, user_id: &str) -> Result<Option<CoachDismissal>, RepositoryError> {
        let conn = connection(pool)?;
        Ok(conn.query_row(
            "SELECT user_id, w_curr, w_prev, applied, recorded_at FROM coach_dismissals WHERE user_id = ?1",
            [user_id],
            dismissal_from_row,
        ).optional()?)
    }

    pub async fn put_dismissal(pool: &DatabasePool, dismissal: &CoachDismissal) -> Result<(), RepositoryError> {
        debug!("Recording coach dismissal in database: user={}", dismissal.user_id);

        let conn = connection(pool)?;
        upsert_dismissal(&conn, dismissal)
    }
}
