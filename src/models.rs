// ABOUTME: Core nutrition domain models for entries, goals, and reusable food templates
// ABOUTME: FoodEntry, NutrientTotals, DailyGoal, FoodTemplate, and their patch types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Domain Models
//!
//! The tracked universe is small: food entries eaten at some instant,
//! a single daily goal, and reusable food templates that stamp out new
//! entries from a gram amount or a piece count. All types serialize to
//! JSON and are stored verbatim in both the local vault and the remote
//! document store, so optional fields are skipped when absent to keep
//! the two representations interchangeable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Type of meal an entry belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Breakfast meal
    Breakfast,
    /// Lunch meal
    Lunch,
    /// Dinner meal
    Dinner,
    /// Snack between meals
    Snack,
}

impl MealType {
    /// Canonical lowercase name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    /// Parse a meal type from its canonical name, case-insensitively.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snack" => Some(Self::Snack),
            _ => None,
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calorie and macronutrient amounts, summable across entries.
///
/// Used both for per-entry values and for aggregated daily totals.
/// Calories are kilocalories; protein, carbs, and fat are grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    /// Energy in kilocalories
    pub calories: f64,
    /// Protein in grams
    pub protein: f64,
    /// Carbohydrates in grams
    pub carbs: f64,
    /// Fat in grams
    pub fat: f64,
}

impl NutrientTotals {
    /// The additive identity.
    pub const ZERO: Self = Self {
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
    };

    /// Construct totals from the four tracked nutrients.
    #[must_use]
    pub const fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    /// Multiply every nutrient by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }

    /// Round every nutrient to the nearest whole number.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            calories: self.calories.round(),
            protein: self.protein.round(),
            carbs: self.carbs.round(),
            fat: self.fat.round(),
        }
    }
}

impl Add for NutrientTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for NutrientTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for NutrientTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// A single logged food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    /// Unique identifier, assigned by the active backend on creation
    pub id: String,
    /// Display name, e.g. `"Elma"` or `"Tavuk Göğsü (150g)"`
    pub name: String,
    /// Energy in kilocalories
    pub calories: f64,
    /// Protein in grams
    pub protein: f64,
    /// Carbohydrates in grams
    pub carbs: f64,
    /// Fat in grams
    pub fat: f64,
    /// Moment the food was eaten, as Unix epoch milliseconds
    pub timestamp: i64,
    /// Meal the entry belongs to, when the user assigned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    /// Set when the entry was stamped out from a food template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_origin: Option<TemplateOrigin>,
}

impl FoodEntry {
    /// The entry's nutrients as a summable value.
    #[must_use]
    pub const fn totals(&self) -> NutrientTotals {
        NutrientTotals {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }

    /// Whether this entry was stamped out from a food template.
    #[must_use]
    pub const fn is_template_derived(&self) -> bool {
        self.template_origin.is_some()
    }
}

/// Input for creating a food entry, before an id and timestamp exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFoodEntry {
    /// Display name
    pub name: String,
    /// Energy in kilocalories
    pub calories: f64,
    /// Protein in grams
    pub protein: f64,
    /// Carbohydrates in grams
    pub carbs: f64,
    /// Fat in grams
    pub fat: f64,
    /// Meal the entry belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
}

impl NewFoodEntry {
    /// Finish the entry with its timestamp. The id is left empty and
    /// assigned by whichever backend stores the entry.
    #[must_use]
    pub fn into_entry(self, timestamp: i64) -> FoodEntry {
        FoodEntry {
            id: String::new(),
            name: self.name,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            timestamp,
            meal_type: self.meal_type,
            template_origin: None,
        }
    }
}

/// Partial update for a food entry. Only the populated fields change;
/// everything else keeps its stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodEntryPatch {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New calorie amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// New protein amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    /// New carbohydrate amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    /// New fat amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    /// New timestamp in epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// New meal assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
}

impl FoodEntryPatch {
    /// Merge the populated fields into `entry`.
    pub fn apply(&self, entry: &mut FoodEntry) {
        if let Some(name) = &self.name {
            entry.name.clone_from(name);
        }
        if let Some(calories) = self.calories {
            entry.calories = calories;
        }
        if let Some(protein) = self.protein {
            entry.protein = protein;
        }
        if let Some(carbs) = self.carbs {
            entry.carbs = carbs;
        }
        if let Some(fat) = self.fat {
            entry.fat = fat;
        }
        if let Some(timestamp) = self.timestamp {
            entry.timestamp = timestamp;
        }
        if let Some(meal_type) = self.meal_type {
            entry.meal_type = Some(meal_type);
        }
    }

    /// `true` when no field is populated and applying would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.timestamp.is_none()
            && self.meal_type.is_none()
    }
}

/// The user's daily nutrition target, replaced wholesale on every update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyGoal {
    /// Daily energy target in kilocalories
    pub calories: f64,
    /// Daily protein target in grams
    pub protein: f64,
    /// Daily carbohydrate target in grams
    pub carbs: f64,
    /// Daily fat target in grams
    pub fat: f64,
}

/// Unit a template's reference nutrition is expressed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateUnit {
    /// Nutrition given per 100 grams; portions are gram amounts
    Gram,
    /// Nutrition given per piece; portions are piece counts
    Piece,
}

/// Reference nutrition of a food template, tagged by its unit so the
/// two portion models cannot be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum TemplateNutrition {
    /// Gram-based template: values are per 100 g of the food
    Gram {
        /// Nutrients contained in 100 g
        per_100g: NutrientTotals,
    },
    /// Piece-based template: values are per single piece
    Piece {
        /// Nutrients contained in one piece
        per_piece: NutrientTotals,
    },
}

impl TemplateNutrition {
    /// The unit this template is portioned in.
    #[must_use]
    pub const fn unit(&self) -> TemplateUnit {
        match self {
            Self::Gram { .. } => TemplateUnit::Gram,
            Self::Piece { .. } => TemplateUnit::Piece,
        }
    }

    /// The stored reference nutrition (per 100 g or per piece).
    #[must_use]
    pub const fn reference(&self) -> &NutrientTotals {
        match self {
            Self::Gram { per_100g } => per_100g,
            Self::Piece { per_piece } => per_piece,
        }
    }

    /// Nutrients for a portion of `amount` grams or pieces.
    ///
    /// Calories round to the nearest whole kilocalorie; protein, carbs,
    /// and fat round to one decimal place.
    #[must_use]
    pub fn portion(&self, amount: f64) -> NutrientTotals {
        let scaled = match self {
            Self::Gram { per_100g } => per_100g.scaled(amount / 100.0),
            Self::Piece { per_piece } => per_piece.scaled(amount),
        };
        NutrientTotals {
            calories: scaled.calories.round(),
            protein: round_tenth(scaled.protein),
            carbs: round_tenth(scaled.carbs),
            fat: round_tenth(scaled.fat),
        }
    }
}

/// A reusable food definition the user logs repeatedly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodTemplate {
    /// Unique identifier, assigned by the active backend on creation
    pub id: String,
    /// Template name, e.g. `"Tavuk Göğsü"`
    pub name: String,
    /// Reference nutrition and portion unit
    pub nutrition: TemplateNutrition,
}

impl FoodTemplate {
    /// Display name for an entry made from this template,
    /// e.g. `"Tavuk Göğsü (150g)"` or `"Yumurta (2 adet)"`.
    #[must_use]
    pub fn portion_name(&self, amount: f64) -> String {
        match self.nutrition.unit() {
            TemplateUnit::Gram => format!("{} ({amount}g)", self.name),
            TemplateUnit::Piece => format!("{} ({amount} adet)", self.name),
        }
    }
}

/// Input for creating a food template, before an id exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFoodTemplate {
    /// Template name
    pub name: String,
    /// Reference nutrition and portion unit
    pub nutrition: TemplateNutrition,
}

impl NewFoodTemplate {
    /// Finish the template. The id is left empty and assigned by
    /// whichever backend stores it.
    #[must_use]
    pub fn into_template(self) -> FoodTemplate {
        FoodTemplate {
            id: String::new(),
            name: self.name,
            nutrition: self.nutrition,
        }
    }
}

/// Partial update for a food template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodTemplatePatch {
    /// New template name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New reference nutrition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<TemplateNutrition>,
}

impl FoodTemplatePatch {
    /// Merge the populated fields into `template`.
    pub fn apply(&self, template: &mut FoodTemplate) {
        if let Some(name) = &self.name {
            template.name.clone_from(name);
        }
        if let Some(nutrition) = self.nutrition {
            template.nutrition = nutrition;
        }
    }
}

/// Record of the template a food entry was stamped out from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOrigin {
    /// Id of the source template
    pub template_id: String,
    /// Portion amount the user chose, in grams or pieces
    pub amount: f64,
    /// Unit the amount is expressed in
    pub unit: TemplateUnit,
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
