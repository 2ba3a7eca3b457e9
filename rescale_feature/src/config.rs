// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative interaction settings.
//!
//! [`RescaleConfig`] carries the plain-data options so hosts can load them
//! from JSON or any other serde format. Features, styles and conditions are
//! code and stay on [`RescaleOptions`].
//!
//! ```
//! use rescale_feature::RescaleConfig;
//!
//! let config: RescaleConfig =
//!     serde_json::from_str(r#"{ "factor": "1.5", "anchor": [10, 20] }"#).unwrap();
//! let options = config.into_options().unwrap();
//! # let _ = options;
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::RescaleError;
use crate::interaction::RescaleOptions;
use crate::property::{anchor_from_slice, parse_factor, validate_factor};

/// A factor given as a number or as numeric text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    /// `2.5`
    Number(f64),
    /// `"2.5"`
    Text(String),
}

impl FactorValue {
    /// Resolves to a finite factor.
    ///
    /// # Errors
    ///
    /// [`RescaleError::InvalidArgument`] for non-numeric text or non-finite numbers.
    pub fn resolve(&self) -> Result<f64, RescaleError> {
        match self {
            Self::Number(value) => validate_factor(*value),
            Self::Text(text) => parse_factor(text),
        }
    }
}

/// Serializable subset of [`RescaleOptions`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescaleConfig {
    /// Initial factor.
    pub factor: Option<FactorValue>,
    /// Initial anchor as `[x, y]`.
    pub anchor: Option<Vec<f64>>,
    /// Whether the anchor marker can be dragged.
    #[serde(alias = "allowAnchorMovement")]
    pub allow_anchor_movement: bool,
}

impl Default for RescaleConfig {
    fn default() -> Self {
        Self {
            factor: None,
            anchor: None,
            allow_anchor_movement: true,
        }
    }
}

impl RescaleConfig {
    /// Validates the settings and turns them into builder options.
    ///
    /// # Errors
    ///
    /// [`RescaleError::InvalidArgument`] for a non-numeric factor or an anchor
    /// that is not two finite numbers.
    pub fn into_options(self) -> Result<RescaleOptions, RescaleError> {
        let mut options = RescaleOptions::new().allow_anchor_movement(self.allow_anchor_movement);
        if let Some(factor) = &self.factor {
            options = options.factor(factor.resolve()?);
        }
        if let Some(anchor) = &self.anchor {
            options = options.anchor(anchor_from_slice(anchor)?);
        }
        Ok(options)
    }
}
