use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::errors::{InvoiceError, Result};

/// Identity block rendered on every invoice, both for the issuing company and
/// for the billed client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tax: String,
}

/// Per-client billing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tax: String,
    pub hourly_price_net: f64,
    pub currency: Currency,
    /// Overrides the settings-wide default VAT when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<f64>,
}

impl ClientProfile {
    /// The fields rendered in the client block of an invoice.
    pub fn company_block(&self) -> CompanyProfile {
        CompanyProfile {
            company: self.company.clone(),
            country: self.country.clone(),
            address: self.address.clone(),
            tax: self.tax.clone(),
        }
    }
}

/// Explicitly threaded settings, read once at process start. Replaces the
/// original tool's process-wide settings object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "Settings::default_vat_value")]
    pub default_vat: f64,
    #[serde(default)]
    pub company: CompanyProfile,
    #[serde(default)]
    pub clients: BTreeMap<String, ClientProfile>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_vat: Self::default_vat_value(),
            company: CompanyProfile::default(),
            clients: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn default_vat_value() -> f64 {
        8.1
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| {
            InvoiceError::Config(format!("cannot read settings `{}`: {err}", path.display()))
        })?;
        serde_json::from_str(&data).map_err(|err| {
            InvoiceError::Config(format!("invalid settings `{}`: {err}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn client(&self, key: &str) -> Result<&ClientProfile> {
        self.clients
            .get(key)
            .ok_or_else(|| InvoiceError::Config(format!("unknown client key `{key}`")))
    }

    /// VAT precedence: explicit override, then the client profile, then the
    /// settings-wide default.
    pub fn vat_for(&self, client: &ClientProfile, override_vat: Option<f64>) -> f64 {
        override_vat.or(client.vat).unwrap_or(self.default_vat)
    }
}
