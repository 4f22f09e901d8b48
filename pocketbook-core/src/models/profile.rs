//! User profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::savings::SavingsPlan;

/// Placeholder image the server serves when no profile image is set.
pub const DEFAULT_PROFILE_IMAGE: &str = "/user.png";

/// The signed-in user's profile.
///
/// The server owns the profile shape, so the client keeps it as an opaque JSON
/// object and only exposes typed accessors for the fields it reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    /// Wraps a raw JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the raw JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Display name.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Account email.
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    /// Declared monthly income.
    pub fn income(&self) -> Option<f64> {
        self.0.get("income").and_then(Value::as_f64)
    }

    /// Monthly savings goal.
    pub fn goal(&self) -> Option<f64> {
        self.0.get("goal").and_then(Value::as_f64)
    }

    /// Amount spent so far this month, as tracked by the server.
    pub fn expense(&self) -> Option<f64> {
        self.0.get("expense").and_then(Value::as_f64)
    }

    /// Income left after this month's expenses.
    pub fn current_saved(&self) -> f64 {
        self.income().unwrap_or(0.0) - self.expense().unwrap_or(0.0)
    }

    /// Profile image URL.
    pub fn profile_image(&self) -> Option<&str> {
        self.0.get("profileImage").and_then(Value::as_str)
    }

    /// Returns true once the profile carries both name and email.
    ///
    /// Settings screens refetch the profile when this is false.
    pub fn is_complete(&self) -> bool {
        self.name().is_some() && self.email().is_some()
    }

    /// Savings allocation stored as `savings[0].savings`.
    pub fn savings(&self) -> Option<SavingsPlan> {
        let raw = self.0.get("savings")?.get(0)?.get("savings")?;
        serde_json::from_value(raw.clone()).ok()
    }

    /// Applies an accepted profile edit to the cached copy.
    pub fn apply_profile_edit(&mut self, name: &str, income: f64, goal: f64) {
        self.0.insert("name".to_string(), Value::from(name));
        self.0.insert("income".to_string(), Value::from(income));
        self.0.insert("goal".to_string(), Value::from(goal));
    }

    /// Replaces the savings allocation, keeping any sibling fields of the
    /// first savings record.
    pub fn apply_savings(&mut self, plan: &SavingsPlan) {
        let mut record = self
            .0
            .get("savings")
            .and_then(|s| s.get(0))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        record.insert(
            "savings".to_string(),
            serde_json::to_value(plan).unwrap_or(Value::Null),
        );
        self.0
            .insert("savings".to_string(), Value::Array(vec![Value::Object(record)]));
    }

    /// Replaces the email after a confirmed change.
    pub fn set_email(&mut self, email: &str) {
        self.0.insert("email".to_string(), Value::from(email));
    }

    /// Resets the profile image to the server default.
    pub fn clear_profile_image(&mut self) {
        self.0
            .insert("profileImage".to_string(), Value::from(DEFAULT_PROFILE_IMAGE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: Value) -> UserProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_accessors() {
        let p = profile(json!({
            "name": "Asha",
            "email": "asha@example.com",
            "income": 5000,
            "goal": 1200.5,
            "profileImage": "https://cdn.example.com/a.png"
        }));

        assert_eq!(p.name(), Some("Asha"));
        assert_eq!(p.email(), Some("asha@example.com"));
        assert_eq!(p.income(), Some(5000.0));
        assert_eq!(p.goal(), Some(1200.5));
        assert!(p.is_complete());
    }

    #[test]
    fn test_incomplete_profile() {
        let p = profile(json!({"name": "Asha"}));
        assert!(!p.is_complete());
        assert!(UserProfile::default().savings().is_none());
    }

    #[test]
    fn test_apply_profile_edit() {
        let mut p = profile(json!({"name": "Old", "email": "a@b.c", "extra": true}));
        p.apply_profile_edit("New", 100.0, 20.0);

        assert_eq!(p.name(), Some("New"));
        assert_eq!(p.income(), Some(100.0));
        assert_eq!(p.goal(), Some(20.0));
        assert_eq!(p.as_map().get("extra"), Some(&json!(true)));
    }

    #[test]
    fn test_current_saved() {
        let p = profile(json!({"income": 5000, "expense": 3200.5}));
        assert_eq!(p.expense(), Some(3200.5));
        assert!((p.current_saved() - 1799.5).abs() < f64::EPSILON);
        assert!((UserProfile::default().current_saved()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_email() {
        let mut p = profile(json!({"email": "old@example.com"}));
        p.set_email("new@example.com");
        assert_eq!(p.email(), Some("new@example.com"));
    }

    #[test]
    fn test_apply_savings_keeps_record_fields() {
        let mut p = profile(json!({
            "savings": [{"_id": "s1", "savings": {"bank": []}}]
        }));
        let plan: SavingsPlan =
            serde_json::from_value(json!({"bank": [{"method": "FD", "amount": 300}]})).unwrap();

        p.apply_savings(&plan);

        let record = &p.as_map()["savings"][0];
        assert_eq!(record["_id"], json!("s1"));
        assert_eq!(p.savings(), Some(plan));
    }

    #[test]
    fn test_clear_profile_image() {
        let mut p = profile(json!({"profileImage": "x.png"}));
        p.clear_profile_image();
        assert_eq!(p.profile_image(), Some(DEFAULT_PROFILE_IMAGE));
    }
}
