use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::{domain::Order, error::UnrecognizedActivityFlag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activity {
    #[default]
    Active,
    Inactive,
}

impl Activity {
    pub fn is_active(self) -> bool {
        self == Activity::Active
    }

    /// Wire representation sent back on updates.
    pub fn as_flag(self) -> bool {
        self.is_active()
    }

    pub fn label(self) -> &'static str {
        match self {
            Activity::Active => "Active",
            Activity::Inactive => "Inactive",
        }
    }
}

impl From<bool> for Activity {
    fn from(value: bool) -> Self {
        if value {
            Activity::Active
        } else {
            Activity::Inactive
        }
    }
}

/// Strict interpretation of a raw flag. `None` and JSON `null` mean "absent".
pub fn interpret(flag: Option<&Value>) -> Result<Activity, UnrecognizedActivityFlag> {
    let Some(flag) = flag else {
        return Ok(Activity::Active);
    };

    match flag {
        Value::Null => Ok(Activity::Active),
        Value::Bool(value) => Ok(Activity::from(*value)),
        Value::String(text) => match text.as_str() {
            "true" | "1" => Ok(Activity::Active),
            "false" | "0" => Ok(Activity::Inactive),
            _ => Err(UnrecognizedActivityFlag { raw: flag.clone() }),
        },
        Value::Number(number) => match number.as_f64() {
            Some(n) if n == 1.0 => Ok(Activity::Active),
            Some(n) if n == 0.0 => Ok(Activity::Inactive),
            _ => Err(UnrecognizedActivityFlag { raw: flag.clone() }),
        },
        Value::Array(_) | Value::Object(_) => Err(UnrecognizedActivityFlag { raw: flag.clone() }),
    }
}

/// Total classification: unrecognised values fall back to [`Activity::Active`].
pub fn classify(flag: Option<&Value>) -> Activity {
    interpret(flag).unwrap_or(Activity::Active)
}

pub fn filter_active(orders: &[Order]) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| order.activity == Activity::Active)
        .cloned()
        .collect()
}

pub fn filter_inactive(orders: &[Order]) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| order.activity == Activity::Inactive)
        .cloned()
        .collect()
}

/// Splits `orders` into `(active, inactive)`, keeping input order in both.
pub fn partition(orders: Vec<Order>) -> (Vec<Order>, Vec<Order>) {
    orders
        .into_iter()
        .partition(|order| order.activity == Activity::Active)
}

impl Serialize for Activity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bool(self.as_flag())
    }
}

impl<'de> Deserialize<'de> for Activity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        match interpret(Some(&raw)) {
            Ok(activity) => Ok(activity),
            Err(err) => {
                warn!(raw = %err.raw, "unrecognized isActive value; treating order as active");
                Ok(Activity::Active)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::OrderId;

    fn order(id: i64, flag: Option<Value>) -> Order {
        let mut raw = json!({ "orderId": id, "orderNo": format!("A-{id}") });
        if let Some(flag) = flag {
            raw["isActive"] = flag;
        }
        serde_json::from_value(raw).expect("order")
    }

    #[test]
    fn recognised_active_representations() {
        for flag in [json!(true), json!("true"), json!(1), json!("1"), json!(1.0), Value::Null] {
            assert_eq!(classify(Some(&flag)), Activity::Active, "flag {flag}");
        }
        assert_eq!(classify(None), Activity::Active);
    }

    #[test]
    fn recognised_inactive_representations() {
        for flag in [json!(false), json!("false"), json!(0), json!("0"), json!(0.0)] {
            assert_eq!(classify(Some(&flag)), Activity::Inactive, "flag {flag}");
        }
    }

    #[test]
    fn unrecognised_values_default_to_active() {
        for flag in [json!("yes"), json!("TRUE"), json!(2), json!(-1), json!([]), json!({})] {
            assert!(interpret(Some(&flag)).is_err(), "flag {flag}");
            assert_eq!(classify(Some(&flag)), Activity::Active, "flag {flag}");
        }
    }

    #[test]
    fn normalises_flag_when_order_is_deserialised() {
        assert_eq!(order(1, Some(json!("1"))).activity, Activity::Active);
        assert_eq!(order(2, Some(json!(0))).activity, Activity::Inactive);
        assert_eq!(order(3, None).activity, Activity::Active);
        assert_eq!(order(4, Some(Value::Null)).activity, Activity::Active);
        assert_eq!(order(5, Some(json!("maybe"))).activity, Activity::Active);
    }

    #[test]
    fn filters_cover_every_order_exactly_once() {
        let orders = vec![
            order(1, Some(json!(true))),
            order(2, Some(json!("false"))),
            order(3, None),
            order(4, Some(json!(0))),
            order(5, Some(json!("1"))),
            order(6, Some(json!("garbage"))),
        ];

        let active = filter_active(&orders);
        let inactive = filter_inactive(&orders);
        assert_eq!(active.len() + inactive.len(), orders.len());

        let mut ids: Vec<OrderId> = active
            .iter()
            .chain(inactive.iter())
            .map(|order| order.order_id)
            .collect();
        ids.sort_by_key(|id| id.0);
        assert_eq!(
            ids,
            vec![OrderId(1), OrderId(2), OrderId(3), OrderId(4), OrderId(5), OrderId(6)]
        );
    }

    #[test]
    fn filters_preserve_input_order() {
        let orders = vec![
            order(9, Some(json!(false))),
            order(3, None),
            order(7, Some(json!("0"))),
            order(1, Some(json!(1))),
        ];

        let active: Vec<i64> = filter_active(&orders).iter().map(|o| o.order_id.0).collect();
        let inactive: Vec<i64> = filter_inactive(&orders).iter().map(|o| o.order_id.0).collect();
        assert_eq!(active, vec![3, 1]);
        assert_eq!(inactive, vec![9, 7]);

        let (active, inactive) = partition(orders);
        assert_eq!(active.len(), 2);
        assert_eq!(inactive[0].order_id, OrderId(9));
    }

    #[test]
    fn serialises_as_native_bool() {
        assert_eq!(serde_json::to_value(Activity::Inactive).expect("json"), json!(false));
        assert_eq!(serde_json::to_value(Activity::Active).expect("json"), json!(true));
    }
}
