//! Scaffolding for adding table filters to an existing resource.
//!
//! Nothing here touches the application's sources: the controller and view
//! drafts are written under `<app_root>/tmp/` for the developer to copy in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::config::FilterConfig;
use crate::errors::{FilterError, Result};
use crate::inflect::{camelize, humanize, pluralize, underscore};

/// Columns never offered as filters when detecting from the catalog.
const SKIPPED_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Text,
    Integer,
    Float,
    Decimal,
    Date,
    Datetime,
    Boolean,
    Select,
    Other(String),
}

impl ColumnType {
    /// Type implied by a form helper in a `name:helper` field spec.
    pub fn from_form_helper(helper: &str) -> Self {
        match helper {
            "text_field" | "email_field" | "password_field" => ColumnType::String,
            "text_area" => ColumnType::Text,
            "number_field" => ColumnType::Integer,
            "date_field" => ColumnType::Date,
            "datetime_field" | "datetime_local_field" => ColumnType::Datetime,
            "check_box" => ColumnType::Boolean,
            "select" | "collection_select" => ColumnType::Select,
            _ => ColumnType::String,
        }
    }

    /// Type reported by column metadata.
    pub fn from_column(kind: &str) -> Self {
        match kind {
            "string" | "varchar" => ColumnType::String,
            "text" => ColumnType::Text,
            "integer" | "bigint" => ColumnType::Integer,
            "float" => ColumnType::Float,
            "decimal" => ColumnType::Decimal,
            "date" => ColumnType::Date,
            "datetime" | "timestamp" => ColumnType::Datetime,
            "boolean" => ColumnType::Boolean,
            other => ColumnType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Date => "date",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Select => "select",
            ColumnType::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// Known models and their columns, keyed by model name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    models: BTreeMap<String, ModelInfo>,
}

impl ModelCatalog {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| FilterError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn insert(&mut self, model: impl Into<String>, info: ModelInfo) {
        self.models.insert(model.into(), info);
    }

    pub fn get(&self, model: &str) -> Option<&ModelInfo> {
        self.models.get(model)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedField {
    pub name: String,
    pub kind: ColumnType,
    pub label: String,
    pub original_spec: String,
}

/// Parse `name:helper` specs. Specs without a `:` are ignored. A repeated name
/// keeps its first position and takes the last spec's helper.
pub fn parse_field_specs<S: AsRef<str>>(specs: &[S]) -> Vec<GeneratedField> {
    specs
        .iter()
        .filter_map(|spec| spec.as_ref().split_once(':'))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, helper)| GeneratedField {
            name: name.to_string(),
            kind: ColumnType::from_form_helper(helper),
            label: humanize(name),
            original_spec: helper.to_string(),
        })
        .fold(Vec::new(), |mut fields: Vec<GeneratedField>, field| {
            match fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field,
                None => fields.push(field),
            }
            fields
        })
}

#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub controller_path: PathBuf,
    pub view_path: PathBuf,
    pub warnings: Vec<String>,
    /// Select fields that need a hand-written options partial.
    pub custom_partial_fields: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModelGenerator {
    model_name: String,
    parent_model: String,
    field_specs: Vec<String>,
    app_root: PathBuf,
    catalog: ModelCatalog,
    config: FilterConfig,
    timestamp: String,
}

impl ModelGenerator {
    pub fn new(
        model_name: impl Into<String>,
        parent_model: impl Into<String>,
        app_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            parent_model: parent_model.into(),
            field_specs: Vec::new(),
            app_root: app_root.into(),
            catalog: ModelCatalog::default(),
            config: FilterConfig::default(),
            timestamp: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    #[must_use]
    pub fn with_field_specs<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_specs = specs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn generate(&self) -> Result<GenerationReport> {
        let mut report = GenerationReport {
            warnings: self.validate_models(),
            ..GenerationReport::default()
        };
        let fields = self.fields();

        let tmp = self.app_root.join("tmp");
        std::fs::create_dir_all(&tmp).map_err(|e| FilterError::io(&tmp, e))?;
        let plural = self.plural_name();

        report.controller_path =
            tmp.join(format!("table_filters_{plural}_controller_{}.rs", self.timestamp));
        write_file(&report.controller_path, &self.controller_code(&fields))?;
        info!(path = %report.controller_path.display(), "wrote controller draft");

        report.view_path = tmp.join(format!("table_filters_{plural}_view_{}.html", self.timestamp));
        write_file(&report.view_path, &self.view_code(&fields))?;
        info!(path = %report.view_path.display(), "wrote view draft");

        report.custom_partial_fields = fields
            .iter()
            .filter(|f| f.kind == ColumnType::Select)
            .map(|f| f.name.clone())
            .collect();
        report.instructions = self.instructions(&fields);
        Ok(report)
    }

    /// Warn about models missing from the catalog; generation continues.
    fn validate_models(&self) -> Vec<String> {
        [&self.model_name, &self.parent_model]
            .into_iter()
            .filter(|model| self.catalog.get(model).is_none())
            .map(|model| {
                warn!(model = model.as_str(), "model not found in catalog");
                format!("Model '{model}' not found. Make sure it exists.")
            })
            .collect()
    }

    /// Fields from the specs, or detected from the catalog when none parse.
    pub fn fields(&self) -> Vec<GeneratedField> {
        let parsed = parse_field_specs(&self.field_specs);
        if !parsed.is_empty() {
            return parsed;
        }
        self.catalog
            .get(&self.model_name)
            .map(|info| {
                info.columns
                    .iter()
                    .filter(|c| !SKIPPED_COLUMNS.contains(&c.name.as_str()))
                    .map(|c| GeneratedField {
                        name: c.name.clone(),
                        kind: ColumnType::from_column(&c.kind),
                        label: humanize(&c.name),
                        original_spec: format!("{}_field", c.kind),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn plural_name(&self) -> String {
        pluralize(&underscore(&self.model_name))
    }

    fn singular_name(&self) -> String {
        underscore(&self.model_name)
    }

    pub fn controller_code(&self, fields: &[GeneratedField]) -> String {
        let plural = self.plural_name();
        let controller = format!("{}Controller", camelize(&plural));
        let parent = underscore(&self.parent_model);
        let columns = if fields.is_empty() {
            "        // No fields specified".to_string()
        } else {
            fields
                .iter()
                .map(|f| format!("            {:?},", f.name))
                .join("\n")
        };
        let allow_list = if fields.is_empty() {
            format!("        Vec::new()\n{columns}")
        } else {
            format!("        vec![\n{columns}\n        ]")
        };

        format!(
            r#"// Generated controller code for {model} table filters
// Add this to: src/controllers/account/{plural}.rs

use table_filters::{{FilterConfig, FilterableResource, Params, SqlQuery}};

pub struct {controller};

impl FilterableResource for {controller} {{
    fn controller_name(&self) -> &str {{
        "{plural}"
    }}

    fn available_filter_attributes(&self) -> Vec<&str> {{
{allow_list}
    }}
}}

impl {controller} {{
    pub fn index(&self, params: &Params, config: &FilterConfig) -> SqlQuery {{
        // Scope to the current {parent} before filtering, adjust as needed
        let {plural} = SqlQuery::new("{plural}");

        // Apply table filters
        let {plural} = self.before_index({plural}, params, config);

        // Pagination goes here if the listing is paginated
        {plural}
    }}
}}
"#,
            model = self.model_name,
        )
    }

    pub fn view_code(&self, fields: &[GeneratedField]) -> String {
        let plural = self.plural_name();
        let singular = self.singular_name();
        let title = humanize(&plural);
        let human = humanize(&singular);
        let human_lower = human.to_lowercase();
        let human_plural_lower = title.to_lowercase();
        let delay = self.config.debounce_delay().as_millis();
        let param_key = &self.config.param_key;

        format!(
            r#"<!-- Generated view code for {model} table filters -->
<!-- Add this to: templates/account/{plural}/index.html -->

<nav class="breadcrumbs">
  <a href="/account/dashboard">Dashboard</a> / {title}
</nav>

<div class="row">
  <div class="col">
    <h1 class="pb-2 mt-0 mb-4 border-bottom">{title}</h1>
  </div>
  <div class="col-auto">
    <a href="/account/teams/{{{{ team.id }}}}/{plural}/new" class="btn btn-primary">New {human}</a>
  </div>
</div>

<!-- Table Filters -->
<div data-controller="table-filters" data-table-filters-delay-value="{delay}">
  <button type="button" data-action="table-filters#toggle">
    <i data-table-filters-target="icon" class="fa fa-filter"></i>
  </button>
  <form method="get" data-table-filters-target="filterForm">
    {{% set columns = {columns} %}}
    {{% include "account/table_filters/_search_form.html" %}}
  </form>
</div>

<!-- Your existing table code here -->
<div class="card">
  {{% if {plural} %}}
    <table class="table">
      <thead>
        <tr>
{headers}
          <th>Actions</th>
        </tr>
      </thead>
      <tbody>
        {{% for {singular} in {plural} %}}
          <tr>
{cells}
            <td>
              <a href="/account/teams/{{{{ team.id }}}}/{plural}/{{{{ {singular}.id }}}}/edit" class="btn btn-sm btn-primary">Edit</a>
            </td>
          </tr>
        {{% endfor %}}
      </tbody>
    </table>
  {{% else %}}
    <div class="card-body text-center">
      <p class="text-muted">No {human_plural_lower} found.</p>
      <a href="/account/teams/{{{{ team.id }}}}/{plural}/new" class="btn btn-primary">Create the first {human_lower}</a>
    </div>
  {{% endif %}}
</div>
<!-- filter inputs submit as {param_key}[column] -->
"#,
            model = self.model_name,
            columns = self.filters_config(fields),
            headers = self.table_headers(fields),
            cells = self.table_cells(fields),
        )
    }

    fn filters_config(&self, fields: &[GeneratedField]) -> String {
        let columns: Map<String, Value> = fields
            .iter()
            .map(|f| {
                let mut column = json!({"type": f.kind.as_str(), "label": f.label});
                if f.kind == ColumnType::Select {
                    column["options"] = json!([]);
                }
                (f.name.clone(), column)
            })
            .collect();
        Value::Object(columns).to_string()
    }

    fn table_headers(&self, fields: &[GeneratedField]) -> String {
        if fields.is_empty() {
            return "          <!-- Add your table headers -->".to_string();
        }
        fields
            .iter()
            .map(|f| format!("          <th>{}</th>", f.label))
            .join("\n")
    }

    fn table_cells(&self, fields: &[GeneratedField]) -> String {
        if fields.is_empty() {
            return "            <!-- Add your table cells -->".to_string();
        }
        let record = self.singular_name();
        fields
            .iter()
            .map(|f| match f.kind {
                ColumnType::Date | ColumnType::Datetime => format!(
                    "            <td>{{{{ {record}.{} | date(format=\"%B %d, %Y\") }}}}</td>",
                    f.name
                ),
                ColumnType::Boolean => format!(
                    "            <td>{{% if {record}.{} %}}Yes{{% else %}}No{{% endif %}}</td>",
                    f.name
                ),
                _ => format!("            <td>{{{{ {record}.{} }}}}</td>", f.name),
            })
            .join("\n")
    }

    fn instructions(&self, fields: &[GeneratedField]) -> Vec<String> {
        let plural = self.plural_name();
        let mut out = vec![
            "1. Copy the controller code and integrate it into your existing controller".to_string(),
            "2. Copy the view code and add the filters to your existing view".to_string(),
            "3. Make sure your model has the necessary associations:".to_string(),
            format!(
                "   - {} belongs to {}",
                self.model_name,
                underscore(&self.parent_model)
            ),
            format!("   - {} has many {plural}", self.parent_model),
        ];
        let selects: Vec<_> = fields
            .iter()
            .filter(|f| f.kind == ColumnType::Select)
            .collect();
        if !selects.is_empty() {
            out.push("4. Configure select field options in the view:".to_string());
            out.extend(
                selects
                    .iter()
                    .map(|f| format!("   - {}: Add appropriate options array", f.name)),
            );
        }
        out.push(format!(
            "5. Test the filters by starting your server and visiting the {plural} page"
        ));
        out
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| FilterError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> ModelCatalog {
        serde_json::from_value(json!({
            "Project": {"columns": [
                {"name": "id", "type": "integer"},
                {"name": "name", "type": "string"},
                {"name": "due_on", "type": "date"},
                {"name": "archived", "type": "boolean"},
                {"name": "created_at", "type": "datetime"}
            ]},
            "Team": {"columns": []}
        }))
        .unwrap()
    }

    #[test]
    fn field_specs_map_helpers() {
        let fields = parse_field_specs(&[
            "title:text_field",
            "notes:text_area",
            "bare",
            "kind:select",
            "title:check_box",
        ]);
        let kinds: Vec<_> = fields.iter().map(|f| (f.name.as_str(), f.kind.clone())).collect();
        assert_eq!(
            kinds,
            vec![
                ("title", ColumnType::Boolean),
                ("notes", ColumnType::Text),
                ("kind", ColumnType::Select),
            ]
        );
        assert_eq!(fields[0].label, "Title");
        assert_eq!(fields[0].original_spec, "check_box");
    }

    #[test]
    fn detects_columns_without_specs() {
        let generator = ModelGenerator::new("Project", "Team", "/app").with_catalog(catalog());
        let names: Vec<_> = generator.fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["name", "due_on", "archived"]);
    }

    #[test]
    fn controller_lists_allowed_columns() {
        let generator = ModelGenerator::new("ProjectTask", "Project", "/app");
        let code = generator.controller_code(&parse_field_specs(&["name:text_field"]));
        assert!(code.contains("pub struct ProjectTasksController;"));
        assert!(code.contains("\"project_tasks\""));
        assert!(code.contains("            \"name\",\n"));
    }

    #[test]
    fn view_renders_cells_by_type() {
        let generator = ModelGenerator::new("Project", "Team", "/app").with_catalog(catalog());
        let view = generator.view_code(&generator.fields());
        assert!(view.contains("<th>Due on</th>"));
        assert!(view.contains("{{ project.due_on | date(format=\"%B %d, %Y\") }}"));
        assert!(view.contains("{% if project.archived %}Yes{% else %}No{% endif %}"));
        assert!(view.contains("{% for project in projects %}"));
        assert!(view.contains("data-table-filters-delay-value=\"300\""));
    }

    #[test]
    fn generate_writes_drafts_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ModelGenerator::new("Invoice", "Team", dir.path())
            .with_catalog(catalog())
            .with_field_specs(["status:select"])
            .with_timestamp("20260101_120000");
        let report = generator.generate().unwrap();

        assert_eq!(report.warnings, vec!["Model 'Invoice' not found. Make sure it exists."]);
        assert_eq!(
            report.controller_path,
            dir.path().join("tmp/table_filters_invoices_controller_20260101_120000.rs")
        );
        let view = std::fs::read_to_string(&report.view_path).unwrap();
        assert!(view.contains(
            r#"{% set columns = {"status":{"type":"select","label":"Status","options":[]}} %}"#
        ));
        assert_eq!(report.custom_partial_fields, vec!["status"]);
        assert!(report.instructions.iter().any(|l| l.starts_with("4. Configure select")));
    }
}
