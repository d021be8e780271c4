//! The instance tree edited in the design tool.
//!
//! A page renders a single [`Tree`]; the props attached to its instances are
//! stored separately, as [`InstanceProps`].

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tree {
    pub id: String,
    pub root: Instance,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Instance {
    pub id: String,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub children: Vec<InstanceChild>,
}

/// A node nested inside an [`Instance`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InstanceChild {
    Instance(Instance),
    Text { value: String },
}

/// The props set on a single instance of a tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceProps {
    pub id: String,
    pub instance_id: String,
    pub tree_id: String,
    #[serde(default)]
    pub props: Vec<UserProp>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserProp {
    pub id: String,
    pub prop: String,
    pub value: PropValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Boolean(bool),
    Number(f64),
    String(String),
}
