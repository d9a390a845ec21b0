//! Form schemas exposed to the front end.

use axum::{extract::Path, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    /// Field name, prefixed with the form prefix when there is one.
    pub id: String,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub name: &'static str,
    pub prefix: Option<&'static str>,
    pub fields: Vec<FormField>,
}

type FieldSpec = (&'static str, &'static str, &'static str, bool);

fn schema(name: &'static str, prefix: Option<&'static str>, fields: &[FieldSpec]) -> FormSchema {
    let fields = fields
        .iter()
        .map(|&(field, label, kind, required)| FormField {
            id: match prefix {
                Some(p) => format!("{}-{}", p, field),
                None => field.to_string(),
            },
            label,
            kind,
            required,
        })
        .collect();
    FormSchema {
        name,
        prefix,
        fields,
    }
}

/// Look up a form schema by name.
pub fn form_schema(name: &str) -> Option<FormSchema> {
    let form = match name {
        "registration" => schema(
            "registration",
            Some("register"),
            &[
                ("fullname", "Full Name", "text", true),
                ("username", "Email Address", "email", true),
                ("username2", "Confirm Email Address", "email", true),
                ("password", "Password", "password", true),
                ("password2", "Verify Password", "password", true),
            ],
        ),
        "signin" => schema(
            "signin",
            None,
            &[
                ("username", "Email Address", "email", true),
                ("password", "Password", "password", true),
            ],
        ),
        "forgot_password" => schema(
            "forgot_password",
            Some("forgot_password"),
            &[("email", "Email Address", "email", true)],
        ),
        "reset_password" => schema(
            "reset_password",
            None,
            &[
                ("password", "New Password", "password", true),
                ("password2", "Verify New Password", "password", true),
            ],
        ),
        "new_project" => schema(
            "new_project",
            None,
            &[
                ("title", "Title", "text", true),
                ("description", "Description", "textarea", false),
                ("template", "Template", "text", false),
            ],
        ),
        _ => return None,
    };
    Some(form)
}

/// `/api/v1/forms/{name}/`.
pub async fn get_form(Path(name): Path<String>) -> Result<Json<FormSchema>, ApiError> {
    form_schema(&name)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("form '{}'", name)))
}

/// `/api/v1/comments/schema/`: payload accepted by comment POSTs.
pub async fn comment_schema() -> Json<Value> {
    Json(json!({
        "schema": {
            "comment": { "type": "textarea", "label": "Comment", "required": true },
            "rating": {
                "type": "select",
                "label": "Rating",
                "required": false,
                "options": ["1", "2", "3", "4", "5"],
            },
        }
    }))
}
