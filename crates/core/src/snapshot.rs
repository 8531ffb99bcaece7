//! JSON snapshots of a migration model
//!
//! Discovery hands its output to the parser as a snapshot, and the parsed
//! model is written back out the same way.

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::model::MigrationModel;

/// Read a model snapshot
pub fn load(path: &Path) -> anyhow::Result<MigrationModel> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading model snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing model snapshot {}", path.display()))
}

/// Write a model snapshot, pretty-printed
pub fn save(model: &MigrationModel, path: &Path) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(model).context("serializing model snapshot")?;
    fs::write(path, text).with_context(|| format!("writing model snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ContainerType, DefinitionType, NewResource, ResourceGraph};
    use crate::model::{Application, ParsedApplication, ParsedApplicationGroup, ResourceKeys, SourceModel};
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let mut graph = ResourceGraph::new();
        let msi = graph
            .add_container(None, NewResource::container("orders.msi", "orders.msi", ContainerType::Installer))
            .unwrap();
        graph
            .add_definition(
                msi,
                NewResource::definition("orders.msi:adf", "ApplicationDefinition.adf", DefinitionType::ApplicationDefinition, "<ApplicationDefinition />"),
            )
            .unwrap();
        let application = Application {
            application_definition: Some(crate::model::ApplicationDefinitionFile::new(ResourceKeys::new(
                "orders.msi",
                "orders.msi:adf",
            ))),
            ..Default::default()
        };
        let model = MigrationModel::new(
            SourceModel::BizTalkGroup(ParsedApplicationGroup {
                applications: vec![ParsedApplication {
                    container_key: "orders.msi".to_string(),
                    application,
                }],
            }),
            graph,
        );

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        save(&model, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.graph.node_count(), 2);
        let definition = loaded.graph.find_definition("orders.msi", "orders.msi:adf").unwrap();
        assert_eq!(loaded.graph.node(definition).unwrap().content(), Some("<ApplicationDefinition />"));
        assert_eq!(loaded.application_group().unwrap().applications.len(), 1);
    }

    #[test]
    fn test_load_rejects_graph_with_dangling_parent() {
        let mut graph = ResourceGraph::new();
        let msi = graph
            .add_container(None, NewResource::container("orders.msi", "orders.msi", ContainerType::Installer))
            .unwrap();
        graph
            .add_definition(
                msi,
                NewResource::definition("orders.msi:adf", "ApplicationDefinition.adf", DefinitionType::ApplicationDefinition, ""),
            )
            .unwrap();
        let mut json = serde_json::to_value(MigrationModel::new(SourceModel::Absent, graph)).unwrap();
        json["graph"]["inner"]["nodes"][1]["parent_ref_id"] = serde_json::Value::Null;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, json.to_string()).unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("inconsistent resource 'orders.msi:adf'"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, "not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing model snapshot"));
    }
}
