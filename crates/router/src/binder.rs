//! Parameter binding: raw request values -> positional, typed arguments.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::{ParamDescriptor, ParamSource, ParamType};

/// Binding failures. The display text is sent to the caller verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("{0} is required")]
    Missing(String),

    #[error("{0} must be a number")]
    NotANumber(String),

    #[error("{0} must be a boolean")]
    NotABoolean(String),
}

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Json(JsonValue),
}

impl ArgValue {
    /// The query-string form that coerces back to this value.
    pub fn to_query_string(&self) -> String {
        match self {
            ArgValue::String(s) => s.clone(),
            ArgValue::Number(n) => n.to_string(),
            ArgValue::Boolean(b) => b.to_string(),
            ArgValue::Json(v) => v.to_string(),
        }
    }
}

/// Coerce a raw query value to `ty`. `None` means the value does not fit.
///
/// Numbers must parse to a finite `f64` (surrounding whitespace ignored);
/// booleans accept exactly `"true"` and `"false"`. Strings and untyped values
/// pass through unchanged.
pub fn coerce(raw: &str, ty: ParamType) -> Option<ArgValue> {
    match ty {
        ParamType::String | ParamType::Unknown => Some(ArgValue::String(raw.to_string())),
        ParamType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ArgValue::Number),
        ParamType::Boolean => match raw {
            "true" => Some(ArgValue::Boolean(true)),
            "false" => Some(ArgValue::Boolean(false)),
            _ => None,
        },
    }
}

/// The raw values a request offers for binding.
#[derive(Debug, Clone, Default)]
pub struct RequestValues {
    pub query: HashMap<String, String>,
    /// Parsed JSON body; `None` when the request carried no body.
    pub body: Option<JsonValue>,
}

/// Arguments in declared parameter order.
///
/// Each position is a slot; an omitted optional argument leaves its slot
/// empty so later positions never shift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    slots: Vec<Option<ArgValue>>,
}

impl BoundArgs {
    pub fn from_slots(slots: Vec<Option<ArgValue>>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        match self.get(index) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        match self.get(index) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        match self.get(index) {
            Some(ArgValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn json(&self, index: usize) -> Option<&JsonValue> {
        match self.get(index) {
            Some(ArgValue::Json(v)) => Some(v),
            _ => None,
        }
    }

    /// Deserialize the JSON argument at `index`. An empty slot is `Ok(None)`.
    pub fn deserialize<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, serde_json::Error> {
        self.json(index)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
    }
}

/// Bind `request` against `descriptors` (already ordered by position).
pub fn bind(request: &RequestValues, descriptors: &[ParamDescriptor]) -> Result<BoundArgs, BindError> {
    let mut slots: Vec<Option<ArgValue>> = vec![None; descriptors.len()];

    for param in descriptors {
        let value = match param.source {
            ParamSource::Body => match &request.body {
                Some(body) => Some(ArgValue::Json(body.clone())),
                None if param.required => return Err(BindError::Missing(param.name.clone())),
                None => None,
            },
            ParamSource::Query => match request.query.get(&param.name) {
                Some(raw) => Some(coerce(raw, param.ty).ok_or_else(|| match param.ty {
                    ParamType::Boolean => BindError::NotABoolean(param.name.clone()),
                    _ => BindError::NotANumber(param.name.clone()),
                })?),
                None if param.required => return Err(BindError::Missing(param.name.clone())),
                None => None,
            },
        };

        if let Some(slot) = slots.get_mut(param.index) {
            *slot = value;
        }
    }

    Ok(BoundArgs { slots })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn query(name: &str, ty: ParamType, required: bool, index: usize) -> ParamDescriptor {
        ParamDescriptor {
            index,
            name: name.to_string(),
            ty,
            source: ParamSource::Query,
            required,
        }
    }

    fn body(name: &str, required: bool, index: usize) -> ParamDescriptor {
        ParamDescriptor {
            index,
            name: name.to_string(),
            ty: ParamType::Unknown,
            source: ParamSource::Body,
            required,
        }
    }

    fn request(pairs: &[(&str, &str)], body: Option<JsonValue>) -> RequestValues {
        RequestValues {
            query: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        }
    }

    #[test]
    fn missing_required_query_names_the_argument() {
        let params = [query("limit", ParamType::Number, true, 0)];
        let err = bind(&request(&[], None), &params).unwrap_err();
        assert_eq!(err.to_string(), "limit is required");
    }

    #[test]
    fn missing_optional_query_leaves_empty_slot() {
        let params = [
            query("name", ParamType::String, false, 0),
            query("page", ParamType::Number, true, 1),
        ];
        let args = bind(&request(&[("page", "2")], None), &params).unwrap();

        assert_eq!(args.len(), 2);
        assert!(args.get(0).is_none());
        assert_eq!(args.number(1), Some(2.0));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let params = [query("limit", ParamType::Number, false, 0)];
        let err = bind(&request(&[("limit", "abc")], None), &params).unwrap_err();
        assert_eq!(err.to_string(), "limit must be a number");
    }

    #[test]
    fn booleans_are_case_sensitive() {
        let params = [query("active", ParamType::Boolean, true, 0)];

        let ok = bind(&request(&[("active", "false")], None), &params).unwrap();
        assert_eq!(ok.boolean(0), Some(false));

        for raw in ["True", "1", "yes", ""] {
            let err = bind(&request(&[("active", raw)], None), &params).unwrap_err();
            assert_eq!(err, BindError::NotABoolean("active".to_string()));
        }
    }

    #[test]
    fn strings_pass_through_unchanged() {
        let params = [query("name", ParamType::String, true, 0)];
        let args = bind(&request(&[("name", "  42 ")], None), &params).unwrap();
        assert_eq!(args.str(0), Some("  42 "));
    }

    #[test]
    fn numbers_reject_nan_infinity_and_empty() {
        for raw in ["NaN", "inf", "-infinity", "", "  "] {
            assert_eq!(coerce(raw, ParamType::Number), None, "{raw:?}");
        }
        assert_eq!(coerce(" 1e3 ", ParamType::Number), Some(ArgValue::Number(1000.0)));
    }

    #[test]
    fn body_binds_whole_document_at_its_position() {
        let params = [
            query("id", ParamType::String, true, 0),
            body("update", true, 1),
        ];
        let doc = json!({ "name": "Widget", "extra": [1, 2] });
        let args = bind(&request(&[("id", "x")], Some(doc.clone())), &params).unwrap();

        assert_eq!(args.str(0), Some("x"));
        assert_eq!(args.json(1), Some(&doc));
    }

    #[test]
    fn missing_required_body_is_rejected() {
        let params = [body("credentials", true, 0)];
        let err = bind(&request(&[], None), &params).unwrap_err();
        assert_eq!(err, BindError::Missing("credentials".to_string()));
    }

    #[test]
    fn deserialize_reads_typed_body() {
        #[derive(serde::Deserialize, PartialEq, Debug)]
        struct Login {
            email: String,
        }

        let args = BoundArgs::from_slots(vec![Some(ArgValue::Json(json!({ "email": "a@b.co" })))]);
        let login: Option<Login> = args.deserialize(0).unwrap();
        assert_eq!(login.unwrap().email, "a@b.co");

        let empty = BoundArgs::from_slots(vec![None]);
        assert!(empty.deserialize::<Login>(0).unwrap().is_none());
    }

    fn param_type() -> impl Strategy<Value = ParamType> {
        prop_oneof![
            Just(ParamType::String),
            Just(ParamType::Number),
            Just(ParamType::Boolean),
            Just(ParamType::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn coercion_is_idempotent(raw in ".*", ty in param_type()) {
            if let Some(value) = coerce(&raw, ty) {
                prop_assert_eq!(coerce(&value.to_query_string(), ty), Some(value));
            }
        }

        #[test]
        fn finite_numbers_survive_their_string_form(n in any::<f64>().prop_filter("finite", |n| n.is_finite())) {
            prop_assert_eq!(coerce(&n.to_string(), ParamType::Number), Some(ArgValue::Number(n)));
        }
    }
}
