// Domain entities and value objects
pub mod body_log;
pub mod coaching;
pub mod conversions;
pub mod diet;

// Re-export common types for easier imports
pub use body_log::{BodyLogEntry, Circumferences, CreateBodyLogRequest, Skinfolds};
pub use coaching::{
    AnalysisState, Anchor, ApplyOutcome, ApplySuggestionRequest, CheckStagnationRequest, CoachingVerdict,
    DismissSuggestionRequest, DismissalRecord, TrendResult,
};
pub use diet::{
    CreateDietPlanRequest, CreateDietVariation, CreateFoodItemRequest, CreateMeal, CreateMealItem, DietPlan,
    DietPlanDetails, DietVariation, FoodItem, MacroComparison, MacroComparisons, Meal, MealItem, MealSummary,
    NutrientTotals, VariationSummary,
};
