//! Disjoint union types with caller-supplied discriminators.
//!
//! `Either<L, R>` and `Either3<A, B, C>` model the polymorphic JSON shapes
//! the LSP data-type catalog leans on heavily (capability toggles,
//! `Either<i32, String>` diagnostic codes, hover contents, …). A generic
//! JSON decoder has no way to know which arm a value inhabits, so decoding
//! takes a *discriminator*: a predicate over the raw JSON element that
//! returns true for the left (or first) side.

use serde_json::Value;

/// A disjoint two-arm union carrying exactly one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Either<L, R> {
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    pub fn left(self) -> Option<L> {
        match self {
            Either::Left(l) => Some(l),
            Either::Right(_) => None,
        }
    }

    pub fn right(self) -> Option<R> {
        match self {
            Either::Left(_) => None,
            Either::Right(r) => Some(r),
        }
    }

    pub fn fold<T>(self, on_left: impl FnOnce(L) -> T, on_right: impl FnOnce(R) -> T) -> T {
        match self {
            Either::Left(l) => on_left(l),
            Either::Right(r) => on_right(r),
        }
    }
}

impl<L, R> Either<L, R>
where
    L: serde::Serialize,
    R: serde::Serialize,
{
    /// Encode whichever side is inhabited in its natural form.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Either::Left(l) => serde_json::to_value(l),
            Either::Right(r) => serde_json::to_value(r),
        }
    }
}

impl<L, R> Either<L, R>
where
    L: for<'de> serde::Deserialize<'de>,
    R: for<'de> serde::Deserialize<'de>,
{
    /// Decode a JSON element by applying `is_left` to select the schema.
    pub fn from_json(value: &Value, is_left: impl FnOnce(&Value) -> bool) -> serde_json::Result<Self> {
        if is_left(value) {
            Ok(Either::Left(serde_json::from_value(value.clone())?))
        } else {
            Ok(Either::Right(serde_json::from_value(value.clone())?))
        }
    }
}

/// The three-arm generalization of `Either`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Either3<A, B, C> {
    First(A),
    Second(B),
    Third(C),
}

impl<A, B, C> Either3<A, B, C> {
    pub fn is_first(&self) -> bool {
        matches!(self, Either3::First(_))
    }

    pub fn is_second(&self) -> bool {
        matches!(self, Either3::Second(_))
    }

    pub fn is_third(&self) -> bool {
        matches!(self, Either3::Third(_))
    }

    pub fn fold<T>(
        self,
        on_first: impl FnOnce(A) -> T,
        on_second: impl FnOnce(B) -> T,
        on_third: impl FnOnce(C) -> T,
    ) -> T {
        match self {
            Either3::First(a) => on_first(a),
            Either3::Second(b) => on_second(b),
            Either3::Third(c) => on_third(c),
        }
    }
}

impl<A, B, C> Either3<A, B, C>
where
    A: serde::Serialize,
    B: serde::Serialize,
    C: serde::Serialize,
{
    pub fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Either3::First(a) => serde_json::to_value(a),
            Either3::Second(b) => serde_json::to_value(b),
            Either3::Third(c) => serde_json::to_value(c),
        }
    }
}

impl<A, B, C> Either3<A, B, C>
where
    A: for<'de> serde::Deserialize<'de>,
    B: for<'de> serde::Deserialize<'de>,
    C: for<'de> serde::Deserialize<'de>,
{
    /// Decode by cascading discriminators: `is_first`, then `is_second`,
    /// else the third arm's schema.
    pub fn from_json(
        value: &Value,
        is_first: impl FnOnce(&Value) -> bool,
        is_second: impl FnOnce(&Value) -> bool,
    ) -> serde_json::Result<Self> {
        if is_first(value) {
            Ok(Either3::First(serde_json::from_value(value.clone())?))
        } else if is_second(value) {
            Ok(Either3::Second(serde_json::from_value(value.clone())?))
        } else {
            Ok(Either3::Third(serde_json::from_value(value.clone())?))
        }
    }
}

/// Ready-made discriminators for the shapes that recur across the LSP
/// type catalog. Each is a plain `fn(&Value) -> bool`, usable directly as
/// the `is_left` / `is_first` / `is_second` argument above.
pub mod discriminate {
    use serde_json::Value;

    pub fn is_json_bool(value: &Value) -> bool {
        value.is_boolean()
    }

    pub fn is_json_number(value: &Value) -> bool {
        value.is_number()
    }

    pub fn is_json_string(value: &Value) -> bool {
        value.is_string()
    }

    pub fn is_json_array(value: &Value) -> bool {
        value.is_array()
    }

    /// Builds a discriminator that checks for an object field's presence,
    /// e.g. `Either<TextEdit, InsertReplaceEdit>` discriminates on `insert`.
    pub fn has_field(name: &'static str) -> impl Fn(&Value) -> bool {
        move |value: &Value| value.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discriminate::*;
    use serde_json::json;

    #[test]
    fn either_bool_or_object_discriminates_on_json_type() {
        let toggle: Either<bool, Value> = Either::from_json(&json!(true), is_json_bool).unwrap();
        assert!(toggle.is_left());

        let options: Either<bool, Value> =
            Either::from_json(&json!({"resolveProvider": true}), is_json_bool).unwrap();
        assert!(options.is_right());
    }

    #[test]
    fn either_number_or_string_diagnostic_code() {
        let numeric: Either<i64, String> = Either::from_json(&json!(42), is_json_number).unwrap();
        assert_eq!(numeric, Either::Left(42));

        let textual: Either<i64, String> =
            Either::from_json(&json!("E0382"), is_json_number).unwrap();
        assert_eq!(textual, Either::Right("E0382".to_string()));
    }

    #[test]
    fn has_field_discriminator_selects_insert_replace_edit() {
        let discriminator = has_field("insert");
        assert!(discriminator(&json!({"insert": {}, "replace": {}, "newText": "x"})));
        assert!(!discriminator(&json!({"range": {}, "newText": "x"})));
    }

    #[test]
    fn either3_cascades_through_predicates() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct MarkupContent {
            kind: String,
            value: String,
        }

        let plain: Either3<String, MarkupContent, Vec<String>> =
            Either3::from_json(&json!("hello"), is_json_string, |_| false).unwrap();
        assert!(plain.is_first());

        let markup: Either3<String, MarkupContent, Vec<String>> = Either3::from_json(
            &json!({"kind": "markdown", "value": "**hi**"}),
            is_json_string,
            |v| v.is_object(),
        )
        .unwrap();
        assert!(markup.is_second());

        let list: Either3<String, MarkupContent, Vec<String>> =
            Either3::from_json(&json!(["a", "b"]), is_json_string, |v| v.is_object()).unwrap();
        assert!(list.is_third());
    }

    #[test]
    fn fold_invokes_matching_closure() {
        let e: Either<i32, String> = Either::Left(5);
        let doubled = e.fold(|n| n * 2, |s| s.len() as i32);
        assert_eq!(doubled, 10);
    }
}
