//! Resource page assembly.
//!
//! A page is Docusaurus markdown: front matter, component imports, an
//! overview table, the fields and methods tables and finally the SQL
//! examples from [`crate::synthesizer`].

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Skipped;
use crate::introspection::ResourceMetadata;
use crate::resource::ResourceDescriptor;
use crate::synthesizer::{render_examples, view_tabs_open};
use crate::types::{FieldRow, PageOptions};

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s+(?:[^>]*?\s+)?href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("static regex must compile")
});
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?p>").expect("static regex must compile"));
static BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("static regex must compile"));
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<code>(.*?)</code>").expect("static regex must compile"));
static PRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<pre>(.*?)</pre>").expect("static regex must compile"));
static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?ul>").expect("static regex must compile"));
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li>(.*?)</li>").expect("static regex must compile"));
static TABLE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:name|td|tr|table)>").expect("static regex must compile")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex must compile"));
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*$").expect("static regex must compile"));

/// Turn an HTML-ish API description into a single markdown table cell.
pub fn clean_description(description: &str) -> String {
    if description.is_empty() {
        return String::new();
    }

    let text = ANCHOR_RE.replace_all(description, "[${2}](${1})");
    let text = PARAGRAPH_RE.replace_all(&text, " ");
    let text = BREAK_RE.replace_all(&text, " ");
    let text = CODE_RE.replace_all(&text, "`${1}`");
    let text = PRE_RE.replace_all(&text, "`${1}`");
    let text = LIST_RE.replace_all(&text, "");
    let text = LIST_ITEM_RE.replace_all(&text, "${1}, ");
    let text = TABLE_TAG_RE.replace_all(&text, "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = text.replace('|', "\\|");
    let text = TRAILING_COMMA_RE.replace(&text, "");

    text.trim().to_string()
}

/// A rendered resource page.
#[derive(Debug, Clone, Default)]
pub struct ResourcePage {
    pub content: String,
    /// Verbs whose example was left out.
    pub skipped: Vec<Skipped>,
}

/// Assemble the documentation page for one resource.
pub fn assemble_page(
    resource: &ResourceDescriptor,
    metadata: &ResourceMetadata,
    options: &PageOptions,
) -> ResourcePage {
    let mut content = String::new();

    if options.include_tables {
        content.push_str(&front_matter(resource));
        content.push_str(&overview(resource));
        content.push_str(&fields_section(resource, metadata));
        content.push_str(&methods_section(metadata));
    }

    let examples = render_examples(resource, metadata);
    content.push_str(&examples.text);

    tracing::info!(
        resource = %resource.path,
        skipped = examples.skipped.len(),
        "page assembled"
    );

    ResourcePage {
        content,
        skipped: examples.skipped,
    }
}

fn front_matter(resource: &ResourceDescriptor) -> String {
    let name = resource.name();
    let service = &resource.path.service;
    let provider = &resource.path.provider;

    format!(
        "---
title: {name}
hide_title: false
hide_table_of_contents: false
keywords:
  - {name}
  - {service}
  - {provider}
  - infrastructure-as-code
  - configuration-as-data
  - cloud inventory
description: Query, deploy and manage {provider} resources using SQL
custom_edit_url: null
image: /img/providers/{provider}/stackql-{provider}-provider-featured-image.png
---

import CopyableCode from '@site/src/components/CopyableCode/CopyableCode';
import Tabs from '@theme/Tabs';
import TabItem from '@theme/TabItem';

Creates, updates, deletes, gets or lists a <code>{name}</code> resource.
"
    )
}

fn overview(resource: &ResourceDescriptor) -> String {
    format!(
        "
## Overview
<table><tbody>
<tr><td><b>Name</b></td><td><code>{name}</code></td></tr>
<tr><td><b>Type</b></td><td>Resource</td></tr>
<tr><td><b>Id</b></td><td><CopyableCode code=\"{id}\" /></td></tr>
</tbody></table>
",
        name = resource.name(),
        id = resource.id,
    )
}

fn field_table(fields: &[FieldRow]) -> String {
    let mut table = String::from("| Name | Datatype | Description |\n|:-----|:---------|:------------|\n");
    for field in fields {
        let _ = writeln!(
            table,
            "| <CopyableCode code=\"{}\" /> | `{}` | {} |",
            field.name,
            field.data_type.as_deref().unwrap_or_default(),
            clean_description(field.description.as_deref().unwrap_or_default()),
        );
    }
    table
}

fn fields_section(resource: &ResourceDescriptor, metadata: &ResourceMetadata) -> String {
    let mut out = String::from("\n## Fields\n");

    if metadata.fields.is_empty() {
        out.push_str("`SELECT` not supported for this resource, use `SHOW METHODS` to view available operations for the resource.\n");
        return out;
    }

    match resource.view().filter(|_| !metadata.view_fields.is_empty()) {
        Some(view) => {
            out.push_str(&view_tabs_open(&view.resource, resource.name()));
            out.push_str("<TabItem value=\"view\">\n\n");
            out.push_str(&field_table(&metadata.view_fields));
            out.push_str("</TabItem>\n<TabItem value=\"resource\">\n\n");
            out.push_str(&field_table(&metadata.fields));
            out.push_str("</TabItem>\n</Tabs>\n");
        }
        None => out.push_str(&field_table(&metadata.fields)),
    }

    out
}

fn methods_section(metadata: &ResourceMetadata) -> String {
    let mut out = String::from(
        "\n## Methods\n| Name | Accessible by | Required Params | Description |\n|:-----|:--------------|:----------------|:------------|\n",
    );
    for method in &metadata.methods {
        let _ = writeln!(
            out,
            "| <CopyableCode code=\"{}\" /> | `{}` | <CopyableCode code=\"{}\" /> | {} |",
            method.method_name,
            method.sql_verb,
            method.required_params,
            clean_description(method.description.as_deref().unwrap_or_default()),
        );
    }
    out
}
