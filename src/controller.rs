//! Per-resource hook that narrows an index listing by the submitted filters.

use tracing::debug;

use crate::config::FilterConfig;
use crate::filter::{apply_filters, Queryable};
use crate::params::Params;
use crate::search_form::{FieldKind, FormSchema, SearchForm};

/// Implemented by each controller whose index page offers column filters.
pub trait FilterableResource {
    /// Plural resource name, e.g. `projects`.
    fn controller_name(&self) -> &str;

    /// Columns this resource allows filtering on. Defaults to none.
    fn available_filter_attributes(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Run before rendering the index action.
    fn before_index<Q: Queryable>(
        &self,
        collection: Q,
        params: &Params,
        config: &FilterConfig,
    ) -> Q {
        match params.nested(&config.param_key) {
            Some(submitted) => {
                apply_filters(collection, &self.available_filter_attributes(), submitted)
            }
            None => {
                debug!(controller = self.controller_name(), "no filters submitted");
                collection
            }
        }
    }

    /// Columns for the view's search form.
    fn filter_attributes_for_view(&self) -> Vec<String> {
        self.available_filter_attributes()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// The search form re-populated from the request; every allow-listed column
    /// is readable even when it was not submitted.
    fn search_form(&self, params: &Params, config: &FilterConfig) -> SearchForm {
        let schema = self
            .available_filter_attributes()
            .into_iter()
            .fold(FormSchema::new(), |schema, name| schema.with_field(name, FieldKind::Text));
        match params.nested(&config.param_key) {
            Some(submitted) => SearchForm::from_params(schema, submitted),
            None => SearchForm::with_schema(schema, Vec::<(String, String)>::new()),
        }
    }
}

/// A resource configured at runtime, as used by the CLI.
#[derive(Debug, Clone)]
pub struct DynamicResource {
    name: String,
    allowed: Vec<String>,
}

impl DynamicResource {
    pub fn new<I, S>(name: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl FilterableResource for DynamicResource {
    fn controller_name(&self) -> &str {
        &self.name
    }

    fn available_filter_attributes(&self) -> Vec<&str> {
        self.allowed.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RecordSet;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Projects;

    impl FilterableResource for Projects {
        fn controller_name(&self) -> &str {
            "projects"
        }

        fn available_filter_attributes(&self) -> Vec<&str> {
            vec!["name", "status"]
        }
    }

    struct Unfiltered;

    impl FilterableResource for Unfiltered {
        fn controller_name(&self) -> &str {
            "widgets"
        }
    }

    fn projects() -> RecordSet {
        RecordSet::new(vec![
            json!({"name": "Apollo", "status": "open"}),
            json!({"name": "Gemini", "status": "closed"}),
        ])
    }

    #[test]
    fn narrows_by_request_filters() {
        let params = Params::from_query("filters[status]=OPEN&filters[owner]=x");
        let out = Projects.before_index(projects(), &params, &FilterConfig::default());
        assert_eq!(out.rows(), [json!({"name": "Apollo", "status": "open"})]);
    }

    #[test]
    fn default_allow_list_filters_nothing() {
        let params = Params::from_query("filters[name]=Apollo");
        let out = Unfiltered.before_index(projects(), &params, &FilterConfig::default());
        assert_eq!(out, projects());
        assert!(Unfiltered.filter_attributes_for_view().is_empty());
    }

    #[test]
    fn custom_param_key() {
        let config = FilterConfig {
            param_key: "q".into(),
            ..FilterConfig::default()
        };
        let params = Params::from_query("q[name]=gem&filters[name]=apo");
        let out = Projects.before_index(projects(), &params, &config);
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0]["name"], "Gemini");
    }

    #[test]
    fn search_form_knows_allowed_columns() {
        let params = Params::from_query("filters[name]=apo");
        let form = Projects.search_form(&params, &FilterConfig::default());
        assert_eq!(form.text("name").unwrap(), "apo");
        assert_eq!(form.text("status").unwrap(), "");

        let empty = Projects.search_form(&Params::new(), &FilterConfig::default());
        assert_eq!(empty.text("name").unwrap(), "");
    }

    #[test]
    fn dynamic_resource() {
        let res = DynamicResource::new("people", ["name"]);
        assert_eq!(res.filter_attributes_for_view(), vec!["name".to_string()]);
    }
}
