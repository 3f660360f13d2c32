use crate::error::{FinanceSeriesError, Result};
use crate::month::MonthKey;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEBT_TYPE: &str = "debt";
pub const DEFAULT_TAX_TREATMENT: &str = "taxable";

/// Metadata for one account, as supplied by the account manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ManifestEntry {
    #[schemars(description = "Account identifier matching the records, e.g. '/broker/roth_ira'")]
    pub account: String,

    #[serde(rename = "type", default)]
    #[schemars(
        description = "Asset class tag such as 'cash', 'securities', 'property' or 'debt'. When empty the source name is used."
    )]
    pub account_type: String,

    #[serde(default)]
    #[schemars(description = "Whether the account is a retirement account")]
    pub retirement: bool,

    #[serde(default)]
    #[schemars(
        description = "For debt accounts: the account this debt is netted against (e.g. a mortgage against its property)"
    )]
    pub debt_applies_to: Option<String>,

    #[serde(default)]
    #[schemars(description = "Display name; defaults to the account identifier")]
    pub title: Option<String>,

    #[serde(default)]
    #[schemars(description = "Tax treatment of retirement accounts (e.g. 'roth', 'pre-tax'); defaults to 'taxable'")]
    pub tax_treatment: Option<String>,

    #[serde(default)]
    #[schemars(with = "Option<String>", description = "First month (inclusive) the property was the primary residence")]
    pub primary_residence_since: Option<MonthKey>,

    #[serde(default)]
    #[schemars(with = "Option<String>", description = "Last month (inclusive) the property was the primary residence")]
    pub primary_residence_until: Option<MonthKey>,

    #[serde(default)]
    #[schemars(with = "Option<String>", description = "First month (inclusive) the property was held as an investment")]
    pub investment_since: Option<MonthKey>,

    #[serde(default)]
    #[schemars(with = "Option<String>", description = "Last month (inclusive) the property was held as an investment")]
    pub investment_until: Option<MonthKey>,
}

impl ManifestEntry {
    pub fn new(account: impl Into<String>, account_type: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            account_type: account_type.into(),
            retirement: false,
            debt_applies_to: None,
            title: None,
            tax_treatment: None,
            primary_residence_since: None,
            primary_residence_until: None,
            investment_since: None,
            investment_until: None,
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.account)
    }

    pub fn is_debt(&self) -> bool {
        self.account_type == DEBT_TYPE
    }

    pub fn tax_treatment(&self) -> &str {
        self.tax_treatment
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TAX_TREATMENT)
    }

    /// The debt target, ignoring blank references.
    pub fn offsets_account(&self) -> Option<&str> {
        self.debt_applies_to.as_deref().filter(|a| !a.is_empty())
    }

    pub fn is_primary_residence(&self, month: MonthKey) -> bool {
        within(month, self.primary_residence_since, self.primary_residence_until)
    }

    pub fn is_investment_property(&self, month: MonthKey) -> bool {
        within(month, self.investment_since, self.investment_until)
    }

    /// Reporting category as of `month`.
    ///
    /// Residence and investment ranges take precedence over the retirement
    /// flag, which prefixes the type.
    pub fn category(&self, month: MonthKey, fallback_type: &str) -> String {
        if self.is_primary_residence(month) {
            "primary residence".to_string()
        } else if self.is_investment_property(month) {
            "investment property".to_string()
        } else {
            self.base_category(fallback_type)
        }
    }

    /// Category from the type and retirement flag alone, ignoring the
    /// residence and investment ranges.
    pub fn base_category(&self, fallback_type: &str) -> String {
        let account_type = if self.account_type.is_empty() {
            fallback_type
        } else {
            self.account_type.as_str()
        };

        if self.retirement {
            format!("retirement {}", account_type)
        } else {
            account_type.to_string()
        }
    }
}

// No bounds at all means the range never applies.
fn within(month: MonthKey, since: Option<MonthKey>, until: Option<MonthKey>) -> bool {
    match (since, until) {
        (None, None) => false,
        (Some(since), Some(until)) => since <= month && month <= until,
        (Some(since), None) => since <= month,
        (None, Some(until)) => month <= until,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountManifest {
    pub entries: Vec<ManifestEntry>,
}

impl AccountManifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, account: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.account == account)
    }

    pub fn require(&self, account: &str) -> Result<&ManifestEntry> {
        self.get(account)
            .ok_or_else(|| FinanceSeriesError::UnknownAccount(account.to_string()))
    }

    pub fn retirement_accounts(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter(|e| e.retirement && !e.is_debt())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ManifestEntry)
    }
}
