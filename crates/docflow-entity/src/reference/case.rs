//! Cases and the contracts that own them.

use serde::{Deserialize, Serialize};

use docflow_core::types::{CaseId, ContractId};

/// A contract grouping one or more cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRef {
    /// Contract id.
    pub id: ContractId,
    /// Contract number as signed.
    pub number: String,
    /// Internal short code (e.g. `"KOB.GW.01"`), if assigned.
    pub our_id: Option<String>,
    /// Human alias.
    pub alias: Option<String>,
}

impl ContractRef {
    /// Label used when listing the contract in generated documents.
    ///
    /// Prefers the internal code over the signed number and appends the
    /// alias when present.
    pub fn label(&self) -> String {
        let code = self
            .our_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.number);
        match self.alias.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(alias) => format!("{code} {alias}"),
            None => code.to_string(),
        }
    }
}

/// A case a document concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRef {
    /// Case id.
    pub id: CaseId,
    /// Display number within its milestone (e.g. `"01.02"`).
    pub number: String,
    /// Case name.
    pub name: String,
    /// Owning contract; offer cases have none.
    pub contract: Option<ContractRef>,
}

impl CaseRef {
    /// Short label: number followed by name.
    pub fn label(&self) -> String {
        match (self.number.trim(), self.name.trim()) {
            ("", name) => name.to_string(),
            (number, "") => number.to_string(),
            (number, name) => format!("{number} {name}"),
        }
    }
}
