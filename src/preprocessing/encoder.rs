//! One-hot encoding of categorical columns

use super::HandleUnknown;
use crate::error::{Result, TaxiFareError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One-hot encoder with a category mapping learned at fit time.
///
/// Categories are kept in first-seen order, so the indicator layout only
/// depends on the row order of the training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    handle_unknown: HandleUnknown,
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
    is_fitted: bool,
}

impl CategoricalEncoder {
    /// Create a new encoder
    pub fn new(handle_unknown: HandleUnknown) -> Self {
        Self {
            handle_unknown,
            columns: Vec::new(),
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the categories of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.columns.clear();
        self.categories.clear();

        for col_name in columns {
            let values = string_column(df, col_name)
                .map_err(|_| TaxiFareError::ColumnNotFound(col_name.clone()))?;

            let mut seen: HashMap<&str, usize> = HashMap::new();
            let mut categories = Vec::new();
            for val in values.into_iter().flatten() {
                if !seen.contains_key(val) {
                    seen.insert(val, categories.len());
                    categories.push(val.to_string());
                }
            }

            self.columns.push(col_name.clone());
            self.categories.push(categories);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each encoded column by its indicator columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(TaxiFareError::ModelNotFitted);
        }

        let mut result = df.clone();
        let n_rows = df.height();

        for (col_name, categories) in self.columns.iter().zip(&self.categories) {
            let values = string_column(df, col_name).map_err(|_| {
                TaxiFareError::DataMismatch(format!(
                    "column '{}' was encoded at training time but is missing",
                    col_name
                ))
            })?;

            let index: HashMap<&str, usize> = categories
                .iter()
                .enumerate()
                .map(|(i, c)| (c.as_str(), i))
                .collect();

            let mut indicators = vec![vec![0.0f64; n_rows]; categories.len()];
            for (row, value) in values.into_iter().enumerate() {
                match value.and_then(|v| index.get(v)) {
                    Some(&pos) => indicators[pos][row] = 1.0,
                    None if self.handle_unknown == HandleUnknown::Error => {
                        return Err(TaxiFareError::DataMismatch(format!(
                            "unknown category {:?} in column '{}'",
                            value.unwrap_or(""),
                            col_name
                        )));
                    }
                    None => {}
                }
            }

            for (name, values) in indicator_names(col_name, categories)
                .into_iter()
                .zip(indicators)
            {
                result.with_column(Series::new(name.into(), values))?;
            }

            result = result.drop(col_name)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    /// Encoded column names in fit order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Learned categories of a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.categories[i].as_slice())
    }

    /// Indicator column names that replace `column`, in category order
    pub fn output_columns(&self, column: &str) -> Option<Vec<String>> {
        self.categories(column)
            .map(|categories| indicator_names(column, categories))
    }
}

fn indicator_names(column: &str, categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .map(|category| format!("{}_{}", column, category))
        .collect()
}

fn string_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column.str()?.clone())
}
