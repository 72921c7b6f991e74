//! Fields substituted into generated documents.
//!
//! Everything here is pure: the values are derived from the document
//! graph without touching the external store.

use std::fmt;

use docflow_core::error::AppError;
use docflow_core::result::AppResult;
use docflow_entity::document::Document;
use docflow_entity::reference::{CaseRef, ContractRef, OfferRef, Recipient};

/// A substitutable field of the document template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateField {
    Number,
    CreationDate,
    Description,
    ContextLabel,
    MainRecipients,
    CcRecipients,
}

impl TemplateField {
    /// Fields every template must define.
    pub const REQUIRED: [TemplateField; 3] = [Self::Number, Self::CreationDate, Self::Description];

    /// Name of the named range (the tag's inner name).
    pub fn range_name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::CreationDate => "creationDate",
            Self::Description => "description",
            Self::ContextLabel => "contextLabel",
            Self::MainRecipients => "mainRecipients",
            Self::CcRecipients => "ccRecipients",
        }
    }

    /// Whether the template must carry a range for this field.
    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for TemplateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.range_name())
    }
}

/// A field with its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub field: TemplateField,
    pub text: String,
}

impl FieldValue {
    pub fn new(field: TemplateField, text: impl Into<String>) -> Self {
        Self {
            field,
            text: text.into(),
        }
    }
}

/// Derive every template field of an outgoing document.
pub fn derive_fields(document: &Document, context_label: String) -> Vec<FieldValue> {
    vec![
        FieldValue::new(TemplateField::Number, document.display_number()),
        FieldValue::new(
            TemplateField::CreationDate,
            document.creation_date.format("%Y-%m-%d").to_string(),
        ),
        FieldValue::new(TemplateField::Description, document.description.trim()),
        FieldValue::new(TemplateField::ContextLabel, context_label),
        FieldValue::new(
            TemplateField::MainRecipients,
            recipients_text(&document.main_recipients),
        ),
        FieldValue::new(TemplateField::CcRecipients, recipients_text(&document.cc_recipients)),
    ]
}

/// Fail when a required field is missing or blank.
pub fn validate_required(fields: &[FieldValue]) -> AppResult<()> {
    let missing: Vec<&str> = TemplateField::REQUIRED
        .iter()
        .filter(|required| {
            !fields
                .iter()
                .any(|f| f.field == **required && !f.text.trim().is_empty())
        })
        .map(|f| f.range_name())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Missing required template fields: {}",
            missing.join(", ")
        )))
    }
}

/// Cases grouped by contract, in first-appearance order, one line per
/// contract: `"{contract}: {case}, {case}"`.
///
/// Cases without a contract are listed on a final line of their own.
pub fn contract_context_label(cases: &[CaseRef]) -> String {
    let mut groups: Vec<(Option<&ContractRef>, Vec<String>)> = Vec::new();
    for case in cases {
        let key = case.contract.as_ref();
        let key_id = key.map(|c| c.id);
        match groups
            .iter_mut()
            .find(|(contract, _)| contract.map(|c| c.id) == key_id)
        {
            Some((_, labels)) => labels.push(case.label()),
            None => groups.push((key, vec![case.label()])),
        }
    }
    // orphan cases last
    groups.sort_by_key(|(contract, _)| contract.is_none());

    groups
        .into_iter()
        .map(|(contract, labels)| match contract {
            Some(contract) => format!("{}: {}", contract.label(), labels.join(", ")),
            None => labels.join(", "),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"{offer description}: {case}, {case}"`.
pub fn offer_context_label(offer: &OfferRef, cases: &[CaseRef]) -> String {
    let labels: Vec<String> = cases.iter().map(CaseRef::label).collect();
    if labels.is_empty() {
        offer.description.clone()
    } else {
        format!("{}: {}", offer.description, labels.join(", "))
    }
}

fn recipients_text(recipients: &[Recipient]) -> String {
    recipients
        .iter()
        .map(|r| r.name.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_core::types::{CaseId, ContractId, ExternalId, OfferId};

    fn contract(id: i64, our_id: &str) -> ContractRef {
        ContractRef {
            id: ContractId(id),
            number: format!("{id}/2024"),
            our_id: Some(our_id.into()),
            alias: None,
        }
    }

    fn case(id: i64, number: &str, contract: Option<ContractRef>) -> CaseRef {
        CaseRef {
            id: CaseId(id),
            number: number.into(),
            name: format!("Case {id}"),
            contract,
        }
    }

    #[test]
    fn test_contract_label_groups_in_first_appearance_order() {
        let a = contract(1, "KOB.GW.01");
        let b = contract(2, "KOB.GW.02");
        let cases = vec![
            case(10, "01.01", Some(b.clone())),
            case(11, "01.02", Some(a.clone())),
            case(12, "", None),
            case(13, "02.01", Some(b)),
        ];
        assert_eq!(
            contract_context_label(&cases),
            "KOB.GW.02: 01.01 Case 10, 02.01 Case 13\nKOB.GW.01: 01.02 Case 11\nCase 12"
        );
    }

    #[test]
    fn test_offer_label() {
        let offer = OfferRef {
            id: OfferId(3),
            description: "Bridge inspection".into(),
            folder_id: ExternalId::new("offer-folder"),
        };
        assert_eq!(offer_context_label(&offer, &[]), "Bridge inspection");
        assert_eq!(
            offer_context_label(&offer, &[case(1, "A", None), case(2, "B", None)]),
            "Bridge inspection: A Case 1, B Case 2"
        );
    }

    #[test]
    fn test_validate_required_names_missing_fields() {
        let fields = vec![
            FieldValue::new(TemplateField::Number, "12"),
            FieldValue::new(TemplateField::Description, "  "),
            FieldValue::new(TemplateField::ContextLabel, "x"),
        ];
        let err = validate_required(&fields).unwrap_err();
        assert_eq!(err.kind, docflow_core::error::ErrorKind::Validation);
        assert!(err.message.contains("creationDate"));
        assert!(err.message.contains("description"));
        assert!(!err.message.contains("number"));
    }
}
