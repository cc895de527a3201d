//! SQL example synthesis for SELECT, INSERT, UPDATE, REPLACE and DELETE.
//!
//! Every template uses `'{{ field }}'` placeholders. When a resource has a
//! `vw_` view, SELECT examples and field tables are wrapped in
//! `<Tabs>`/`<TabItem>` markup with the view as the default tab.
//!
//! Synthesis is best-effort: [`render_examples`] logs a failing verb, emits
//! nothing for it and records a [`Skipped`] entry, then moves on.

use serde_json::Value;

use crate::error::{Skipped, SynthesisError};
use crate::fields::derive_field_sets;
use crate::introspection::ResourceMetadata;
use crate::manifest::{declared_type, manifest_yaml};
use crate::page::clean_description;
use crate::resource::ResourceDescriptor;
use crate::types::{json_type_name, placeholder, FieldRow, MethodRow, ResourcePath, SqlVerb};

const SQL_BLOCK_START: &str = "```sql";
const YAML_BLOCK_START: &str = "```yaml";
const BLOCK_END: &str = "```";

/// Examples for one resource, plus the verbs that could not be rendered.
#[derive(Debug, Clone, Default)]
pub struct ExampleSet {
    pub text: String,
    pub skipped: Vec<Skipped>,
}

/// Pick the method used as the example for `verb`.
///
/// Fewest required params wins; ties go to the earlier row.
pub fn representative_method(methods: &[MethodRow], verb: SqlVerb) -> Option<&MethodRow> {
    methods
        .iter()
        .filter(|m| m.verb() == Some(verb))
        .min_by_key(|m| m.required_param_list().len())
}

/// `a = '{{ a }}' AND b = '{{ b }}'`
pub fn param_conditions(params: &[String]) -> String {
    params
        .iter()
        .map(|p| format!("{} = {}", p, placeholder(p)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn where_line(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", param_conditions(params))
    }
}

/// Tab header for a view/resource pair.
pub(crate) fn view_tabs_open(view_name: &str, resource_name: &str) -> String {
    format!(
        "<Tabs\n    defaultValue=\"view\"\n    values={{[\n        {{ label: '{view_name}', value: 'view' }},\n        {{ label: '{resource_name}', value: 'resource' }}\n    ]}}\n>\n"
    )
}

fn select_block(path: &ResourcePath, fields: &[FieldRow], params: &[String]) -> String {
    let columns = fields
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "{SQL_BLOCK_START}\nSELECT\n{columns}\nFROM {path}\n{where_line};\n{BLOCK_END}\n",
        where_line = where_line(params)
    )
}

/// SELECT example for a resource.
///
/// With `view` fields present, the view's SELECT is the default tab and the
/// resource's own SELECT the second.
pub fn select_example(
    path: &ResourcePath,
    method: &MethodRow,
    fields: &[FieldRow],
    view: Option<(&ResourcePath, &[FieldRow])>,
) -> String {
    let params = method.required_param_list();
    let description = clean_description(method.description.as_deref().unwrap_or_default());

    let mut out = format!("\n## `SELECT` examples\n\n{description}\n\n");

    match view.filter(|(_, view_fields)| !view_fields.is_empty()) {
        Some((view_path, view_fields)) => {
            out.push_str(&view_tabs_open(&view_path.resource, &path.resource));
            out.push_str("<TabItem value=\"view\">\n\n");
            out.push_str(&select_block(view_path, view_fields, &params));
            out.push_str("</TabItem>\n<TabItem value=\"resource\">\n\n");
            out.push_str(&select_block(path, fields, &params));
            out.push_str("</TabItem>\n</Tabs>\n");
        }
        None => out.push_str(&select_block(path, fields, &params)),
    }

    out
}

fn insert_block(path: &ResourcePath, columns: &[String], values: &[String]) -> String {
    format!(
        "{SQL_BLOCK_START}\n/*+ create */\nINSERT INTO {path} (\n{columns}\n)\nSELECT \n{values}\n;\n{BLOCK_END}\n",
        columns = columns.join(",\n"),
        values = values.join(",\n"),
    )
}

/// INSERT example with "All Properties", optional "Required Properties" and
/// "Manifest" tabs.
///
/// # Errors
///
/// Returns `SynthesisError` if the request body has an unexpected shape or
/// the manifest cannot be serialized.
pub fn insert_example(
    path: &ResourcePath,
    method: &MethodRow,
    request_body: Option<&Value>,
) -> Result<String, SynthesisError> {
    let params = method.required_param_list();
    let sets = derive_field_sets(&params, request_body)?;
    let manifest = manifest_yaml(&path.resource, &params, request_body)?;
    let with_required = sets.has_distinct_required();

    let mut tabs = Vec::new();
    if with_required {
        tabs.push("{ label: 'Required Properties', value: 'required' }");
    }
    tabs.push("{ label: 'All Properties', value: 'all' }");
    tabs.push("{ label: 'Manifest', value: 'manifest' }");

    let mut out = format!(
        "\n## `INSERT` example\n\nUse the following StackQL query and manifest file to create a new <code>{}</code> resource.\n\n",
        path.resource
    );
    out.push_str("<Tabs\n    defaultValue=\"all\"\n    values={[\n");
    for (i, tab) in tabs.iter().enumerate() {
        let sep = if i + 1 < tabs.len() { "," } else { "" };
        out.push_str(&format!("        {tab}{sep}\n"));
    }
    out.push_str("    ]}\n>\n");

    out.push_str("<TabItem value=\"all\">\n\n");
    out.push_str(&insert_block(path, &sets.all_columns, &sets.all_values));
    out.push_str("</TabItem>\n");

    if with_required {
        out.push_str("<TabItem value=\"required\">\n\n");
        out.push_str(&insert_block(
            path,
            &sets.required_columns,
            &sets.required_values,
        ));
        out.push_str("</TabItem>\n");
    }

    out.push_str("<TabItem value=\"manifest\">\n\n");
    out.push_str(&format!("{YAML_BLOCK_START}\n{manifest}{BLOCK_END}\n"));
    out.push_str("</TabItem>\n</Tabs>\n");

    Ok(out)
}

/// `field = <placeholder>` assignments for every request body property.
///
/// `boolean` renders as `true|false` and `number` as `number`; everything
/// else as a quoted placeholder.
pub fn set_assignments(request_body: Option<&Value>) -> Result<Vec<String>, SynthesisError> {
    let body = match request_body {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(body)) => body,
        Some(other) => {
            return Err(SynthesisError::RequestBodyNotObject {
                actual: json_type_name(other).to_string(),
            })
        }
    };
    let props = match body.get("properties") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(props)) => props,
        Some(other) => {
            return Err(SynthesisError::PropertiesNotObject {
                actual: json_type_name(other).to_string(),
            })
        }
    };

    Ok(props
        .iter()
        .map(|(field, schema)| {
            let field_type = schema.as_object().map(declared_type).unwrap_or("string");
            match field_type {
                "boolean" => format!("{field} = true|false"),
                "number" => format!("{field} = number"),
                _ => format!("{field} = {}", placeholder(field)),
            }
        })
        .collect())
}

/// UPDATE or REPLACE example; the two differ only in keyword and wording.
///
/// # Errors
///
/// Returns `SynthesisError` if the request body has an unexpected shape.
pub fn update_example(
    path: &ResourcePath,
    method: &MethodRow,
    request_body: Option<&Value>,
    verb: SqlVerb,
) -> Result<String, SynthesisError> {
    let params = method.required_param_list();
    let assignments = set_assignments(request_body)?;

    let (keyword, description) = match verb {
        SqlVerb::Replace => (
            "REPLACE",
            format!(
                "Replaces all fields in the specified <code>{}</code> resource.",
                path.resource
            ),
        ),
        _ => (
            "UPDATE",
            format!("Updates a <code>{}</code> resource.", path.resource),
        ),
    };

    // Assignments share one line; conditions go on the line after WHERE.
    let where_block = if params.is_empty() {
        String::new()
    } else {
        format!("WHERE \n{}", param_conditions(&params))
    };

    Ok(format!(
        "\n## `{keyword}` example\n\n{description}\n\n{SQL_BLOCK_START}\n/*+ update */\n{keyword} {path}\nSET \n{assignments}\n{where_block};\n{BLOCK_END}\n",
        assignments = assignments.join(","),
    ))
}

/// DELETE example; only the required params are involved.
pub fn delete_example(path: &ResourcePath, method: &MethodRow) -> String {
    let params = method.required_param_list();
    format!(
        "\n## `DELETE` example\n\nDeletes the specified <code>{resource}</code> resource.\n\n{SQL_BLOCK_START}\n/*+ delete */\nDELETE FROM {path}\n{where_line};\n{BLOCK_END}\n",
        resource = path.resource,
        where_line = where_line(&params),
    )
}

/// Render all examples for a resource in SELECT, INSERT, UPDATE, REPLACE,
/// DELETE order.
///
/// Verbs without a method are left out. A verb whose synthesis fails is
/// logged, contributes nothing to the text and is listed in `skipped`.
pub fn render_examples(resource: &ResourceDescriptor, metadata: &ResourceMetadata) -> ExampleSet {
    let mut set = ExampleSet::default();

    for verb in SqlVerb::EXAMPLE_ORDER {
        let Some(method) = representative_method(&metadata.methods, verb) else {
            continue;
        };
        let request_body = resource.request_body(&method.method_name);

        let rendered = match verb {
            SqlVerb::Select => {
                let view = resource
                    .view()
                    .map(|view_path| (view_path, metadata.view_fields.as_slice()));
                Ok(select_example(&resource.path, method, &metadata.fields, view))
            }
            SqlVerb::Insert => insert_example(&resource.path, method, request_body),
            SqlVerb::Update | SqlVerb::Replace => {
                update_example(&resource.path, method, request_body, verb)
            }
            SqlVerb::Delete => Ok(delete_example(&resource.path, method)),
            SqlVerb::Exec => continue,
        };

        match rendered {
            Ok(text) => set.text.push_str(&text),
            Err(err) => {
                tracing::warn!(
                    resource = %resource.path,
                    verb = %verb,
                    method = %method.method_name,
                    error = %err,
                    "skipping example"
                );
                set.skipped.push(Skipped {
                    resource: resource.path.resource.clone(),
                    verb,
                    reason: err.to_string(),
                });
            }
        }
    }

    set
}
