//! Model builders shared by the stage unit tests

use crate::graph::{ContainerType, DefinitionType, NewResource, ResourceGraph};
use crate::model::{
    Application, MigrationModel, ParsedApplication, ParsedApplicationGroup, ResourceKeys, SourceModel,
};

pub(crate) const INSTALLER_KEY: &str = "app.msi";
pub(crate) const CABINET_KEY: &str = "app.msi:cab1";

/// An installer holding one cabinet, which holds the given documents
pub(crate) fn graph_with(definitions: &[(&str, DefinitionType, &str)]) -> ResourceGraph {
    let mut graph = ResourceGraph::new();
    let msi = graph
        .add_container(None, NewResource::container(INSTALLER_KEY, "app.msi", ContainerType::Installer))
        .unwrap();
    let cab = graph
        .add_container(Some(msi), NewResource::container(CABINET_KEY, "cab1", ContainerType::Cabinet))
        .unwrap();
    for (key, definition_type, content) in definitions {
        graph
            .add_definition(cab, NewResource::definition(*key, *key, *definition_type, *content))
            .unwrap();
    }
    graph
}

/// Keys of a document in the test cabinet
pub(crate) fn keys(definition_key: &str) -> ResourceKeys {
    ResourceKeys::new(CABINET_KEY, definition_key)
}

pub(crate) fn model_with(applications: Vec<Application>, graph: ResourceGraph) -> MigrationModel {
    let applications = applications
        .into_iter()
        .map(|application| ParsedApplication {
            container_key: INSTALLER_KEY.to_string(),
            application,
        })
        .collect();
    MigrationModel::new(
        SourceModel::BizTalkGroup(ParsedApplicationGroup { applications }),
        graph,
    )
}

pub(crate) fn app(model: &MigrationModel, index: usize) -> &Application {
    &model.application_group().unwrap().applications[index].application
}
