//! Enrichment prompt assembly.

use prospecto_core::{field_value, is_headquarters_tax_id, FieldMap, FieldName};

/// Which investigation the assistant is asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// The known CNPJ already denotes a headquarters; confirm and enrich it.
    HeadquartersOnly,
    /// Identify the establishment at the location, then its headquarters.
    BranchThenHeadquarters,
}

impl PromptVariant {
    #[must_use]
    pub fn for_fields(known: &FieldMap) -> Self {
        if is_headquarters_tax_id(field_value(known, FieldName::TaxId)) {
            PromptVariant::HeadquartersOnly
        } else {
            PromptVariant::BranchThenHeadquarters
        }
    }
}

const PREAMBLE: &str = "You are a business-intelligence research assistant with a forensic focus, \
specialised in verifying and completing Brazilian company records. Your mission is to find the \
CURRENT reality of an establishment.";

const HEADQUARTERS_DIRECTIVE: &str = "\
Main directive: headquarters analysis
The user believes this location is the HEADQUARTERS (matriz) of a company, probably because the \
CNPJ establishment sequence is 0001. Investigate, confirm, and enrich the data of this \
headquarters only.

Verification process:
1. Investigation: using the name, address, and CNPJ (if any), find the company registered at this location.
2. Confirmation: check that the CNPJ found really is a headquarters and confirm its registration status (ATIVA, BAIXADA, ...).
3. Enrichment: complete every registration field you can for this headquarters from official sources (Receita Federal and similar).
4. Qualitative analysis: describe the main activity and the customer profile.
5. Assistant note: explain your verification. If the CNPJ is not a headquarters, say what you found instead.";

const BRANCH_DIRECTIVE: &str = "\
Main directive: branch and headquarters analysis
First identify the establishment at the given location (treated as a BRANCH or point of \
operation), THEN find its corresponding HEADQUARTERS.

Step 1, find the branch:
1. Search for the CNPJ tied to the branch's name and address.
2. Check the registration status of that CNPJ (ATIVA, BAIXADA, ...).
3. If the CNPJ is BAIXADA, immediately search for ANOTHER CNPJ with status ATIVA at the same address. An active CNPJ always takes priority.

Step 2, identify the headquarters:
1. From the active company found, find its headquarters (CNPJ establishment sequence 0001).
2. Verify the headquarters address against government sources; web listings may be outdated.";

const OUTPUT_RULES: &str = "\
Output rules (both directives):
Your answer MUST be a single JSON object and NOTHING else.
- If the branch and the headquarters are the same entity (same CNPJ at the same location), \"establishments\" MUST contain a single object of kind \"headquarters\".
- Under the headquarters directive, \"establishments\" contains a single object of kind \"headquarters\".
- Under the branch directive, when the headquarters is a distinct entity, \"establishments\" contains two objects: the \"branch\" first, then the \"headquarters\".
Do NOT include coordinates.

Response format (example with two establishments):
{
  \"establishments\": [
    {
      \"kind\": \"branch\",
      \"fields\": {
        \"trade_name\": \"...\", \"legal_name\": \"...\", \"tax_id\": \"...\", \"registration_status\": \"ATIVA\",
        \"street\": \"...\", \"number\": \"...\", \"district\": \"...\", \"city\": \"...\", \"state\": \"...\",
        \"postal_code\": \"...\", \"phone\": \"...\", \"website\": \"...\", \"email\": \"...\",
        \"activity\": \"...\", \"customers\": \"...\"
      }
    },
    {
      \"kind\": \"headquarters\",
      \"fields\": { \"trade_name\": \"...\", \"tax_id\": \"...\", \"...\": \"...\" }
    }
  ],
  \"assistant_note\": \"...\"
}
Cite sources inside activity, customers, and assistant_note as [1], [2], ...";

/// Builds the enrichment prompt from the fields currently known for the location.
#[must_use]
pub fn build_prompt(known: &FieldMap) -> String {
    let value = |field| field_value(known, field).trim();
    let tax_id = match value(FieldName::TaxId) {
        "" => "not provided",
        other => other,
    };

    let mut prompt = String::with_capacity(4096);
    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\nCurrent situation:\nA user identified a location with the following data:\n");
    prompt.push_str(&format!(
        "- Trade name: \"{}\"\n",
        value(FieldName::TradeName)
    ));
    prompt.push_str(&format!(
        "- Address: \"{}, {}, {}, {} - {}\"\n",
        value(FieldName::Street),
        value(FieldName::Number),
        value(FieldName::District),
        value(FieldName::City),
        value(FieldName::State),
    ));
    prompt.push_str(&format!("- CNPJ provided: \"{tax_id}\"\n"));

    let extra: Vec<_> = [
        FieldName::LegalName,
        FieldName::RegistrationStatus,
        FieldName::PostalCode,
        FieldName::Phone,
        FieldName::Website,
        FieldName::Email,
    ]
    .into_iter()
    .filter(|f| !value(*f).is_empty())
    .collect();
    if !extra.is_empty() {
        prompt.push_str("The user also confirmed these values; treat them as reliable:\n");
        for field in extra {
            prompt.push_str(&format!("- {}: \"{}\"\n", field.label(), value(field)));
        }
    }

    prompt.push('\n');
    prompt.push_str(match PromptVariant::for_fields(known) {
        PromptVariant::HeadquartersOnly => HEADQUARTERS_DIRECTIVE,
        PromptVariant::BranchThenHeadquarters => BRANCH_DIRECTIVE,
    });
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_RULES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(pairs: &[(FieldName, &str)]) -> FieldMap {
        pairs.iter().map(|(f, v)| (*f, (*v).to_string())).collect()
    }

    #[test]
    fn headquarters_tax_id_selects_headquarters_variant() {
        let fields = known(&[(FieldName::TaxId, "12.345.678/0001-99")]);
        assert_eq!(
            PromptVariant::for_fields(&fields),
            PromptVariant::HeadquartersOnly
        );
        assert!(build_prompt(&fields).contains("headquarters analysis"));
    }

    #[test]
    fn branch_or_missing_tax_id_selects_branch_variant() {
        let branch = known(&[(FieldName::TaxId, "12.345.678/0002-10")]);
        assert_eq!(
            PromptVariant::for_fields(&branch),
            PromptVariant::BranchThenHeadquarters
        );
        assert_eq!(
            PromptVariant::for_fields(&FieldMap::new()),
            PromptVariant::BranchThenHeadquarters
        );
    }

    #[test]
    fn prompt_embeds_known_fields() {
        let fields = known(&[
            (FieldName::TradeName, "Padaria Real"),
            (FieldName::Street, "Rua Augusta"),
            (FieldName::Number, "10"),
            (FieldName::City, "São Paulo"),
            (FieldName::Phone, "(11) 3333-4444"),
        ]);
        let prompt = build_prompt(&fields);
        assert!(prompt.contains("- Trade name: \"Padaria Real\""));
        assert!(prompt.contains("Rua Augusta, 10, , São Paulo - "));
        assert!(prompt.contains("CNPJ provided: \"not provided\""));
        assert!(prompt.contains("- Phone: \"(11) 3333-4444\""));
    }
}
