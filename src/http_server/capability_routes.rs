//! Capability Discovery
//!
//! `GET /mcp` describes the student operations for automated tool clients.
//! The table is static; `tests/http_facade.rs` checks that every listed
//! route and method is actually served.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};

/// One discoverable operation
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    pub name: &'static str,
    pub description: &'static str,
    pub route: &'static str,
    pub method: &'static str,
    /// Input name -> type name
    pub inputs: &'static [(&'static str, &'static str)],
    pub outputs: &'static str,
}

/// Every operation the facade exposes
pub const CAPABILITIES: [Capability; 5] = [
    Capability {
        name: "list_students",
        description: "Get a page of students ordered by student_id",
        route: "/students",
        method: "GET",
        inputs: &[("limit", "int"), ("skip", "int")],
        outputs: "list of student objects",
    },
    Capability {
        name: "create_student",
        description: "Insert a new student record",
        route: "/students",
        method: "POST",
        inputs: &[
            ("student_id", "str"),
            ("first_name", "str"),
            ("last_name", "str"),
            ("age", "int"),
            ("scores", "dict"),
            ("active", "bool"),
        ],
        outputs: "inserted_id",
    },
    Capability {
        name: "get_student",
        description: "Fetch one student by student_id",
        route: "/students/{student_id}",
        method: "GET",
        inputs: &[("student_id", "str")],
        outputs: "student object",
    },
    Capability {
        name: "update_student",
        description: "Partially update a student; scores.<subject> sets one score",
        route: "/students/{student_id}",
        method: "PATCH",
        inputs: &[
            ("student_id", "str"),
            ("first_name", "str"),
            ("last_name", "str"),
            ("age", "int"),
            ("scores", "dict"),
            ("scores.<subject>", "int"),
            ("active", "bool"),
        ],
        outputs: "matched, modified",
    },
    Capability {
        name: "delete_student",
        description: "Delete a student by student_id",
        route: "/students/{student_id}",
        method: "DELETE",
        inputs: &[("student_id", "str")],
        outputs: "deleted",
    },
];

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    route: &'static str,
    method: &'static str,
    inputs: Map<String, Value>,
    outputs: &'static str,
}

impl From<&Capability> for Tool {
    fn from(capability: &Capability) -> Self {
        Self {
            name: capability.name,
            description: capability.description,
            route: capability.route,
            method: capability.method,
            inputs: capability
                .inputs
                .iter()
                .map(|(name, ty)| (name.to_string(), Value::from(*ty)))
                .collect(),
            outputs: capability.outputs,
        }
    }
}

#[derive(Debug, Serialize)]
struct CapabilityDocument {
    tools: Vec<Tool>,
}

/// Create the discovery route
pub fn capability_routes() -> Router {
    Router::new().route("/mcp", get(capability_handler))
}

async fn capability_handler() -> Json<Value> {
    Json(capability_document())
}

/// The discovery document as JSON
pub fn capability_document() -> Value {
    let document = CapabilityDocument {
        tools: CAPABILITIES.iter().map(Tool::from).collect(),
    };
    serde_json::to_value(document).unwrap_or(Value::Null)
}
