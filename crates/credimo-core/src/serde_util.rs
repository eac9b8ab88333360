//! Serde helpers shared by partial-update payloads.

/// Three-state optional field: `Some(Some(v))` sets, JSON `null`
/// (`Some(None)`) clears, an absent field (`None`) keeps the current
/// value. Plain `Option<Option<T>>` collapses `null` and absent into
/// the same case, so fields where clearing is meaningful opt into this
/// module with `#[serde(default, with = "...")]`.
pub mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::models::task::UpdateTask;
    use uuid::Uuid;

    #[test]
    fn null_clears_and_absent_keeps() {
        let patch: UpdateTask =
            serde_json::from_str(r#"{"assigned_to": null, "title": "rever contrato"}"#).unwrap();
        assert_eq!(patch.assigned_to, Some(None));
        assert!(patch.due_date.is_none());
        assert!(patch.description.is_none());

        let id = Uuid::new_v4();
        let patch: UpdateTask =
            serde_json::from_value(serde_json::json!({ "assigned_to": id })).unwrap();
        assert_eq!(patch.assigned_to, Some(Some(id)));
    }
}
