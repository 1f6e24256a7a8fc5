//! Prompt helpers for the interactive flow.
//!
//! Relational fields are never typed free-form: callers fetch the candidate
//! rows, build a [`ChoiceList`] mapping display labels to row ids, and present
//! it as a selection prompt. Invalid foreign-key entry is impossible by
//! construction.

use crate::error::{AppError, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect, Input, Select};
use num_traits::FromPrimitive;
use sqlx::types::Decimal;

/// An ordered display-label -> id mapping presented as a selection prompt.
pub struct ChoiceList {
    labels: Vec<String>,
    ids: Vec<i32>,
}

impl ChoiceList {
    /// Builds a choice list from `(label, id)` pairs, preserving their order.
    pub fn new(items: impl IntoIterator<Item = (String, i32)>) -> Self {
        let (labels, ids) = items.into_iter().unzip();
        Self { labels, ids }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The id behind the given selection index.
    pub fn id_at(&self, index: usize) -> Option<i32> {
        self.ids.get(index).copied()
    }

    /// Presents the list as a `Select` prompt and returns the chosen id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cli` when the list is empty and `AppError::Dialoguer`
    /// when the terminal interaction fails.
    pub fn select(&self, prompt: &str) -> Result<i32> {
        self.ensure_not_empty(prompt)?;
        let index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(&self.labels)
            .default(0)
            .interact()?;
        Ok(self.ids[index])
    }

    /// Presents the list as a `FuzzySelect` prompt, better suited to long
    /// lists such as the full employee roster.
    pub fn fuzzy_select(&self, prompt: &str) -> Result<i32> {
        self.ensure_not_empty(prompt)?;
        let index = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(&self.labels)
            .default(0)
            .interact()?;
        Ok(self.ids[index])
    }

    fn ensure_not_empty(&self, prompt: &str) -> Result<()> {
        if self.is_empty() {
            return Err(AppError::Cli(format!(
                "No candidates available for '{}'",
                prompt
            )));
        }
        Ok(())
    }
}

/// Prompts for a non-empty line of text.
pub fn input_text(prompt: &str) -> Result<String> {
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("Value must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Prompts for a salary and converts it to `Decimal`. Dialoguer re-prompts
/// on unparsable input; negative values are rejected by the validator.
pub fn input_salary(prompt: &str) -> Result<Decimal> {
    let value: f64 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .validate_with(|input: &f64| -> std::result::Result<(), &str> {
            if *input < 0.0 {
                Err("Salary must not be negative")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Decimal::from_f64(value)
        .ok_or_else(|| AppError::Cli(format!("Cannot represent {} as a decimal salary", value)))
}

/// Presents a yes/no confirmation.
pub fn confirm(prompt: &str) -> Result<bool> {
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(answer)
}
