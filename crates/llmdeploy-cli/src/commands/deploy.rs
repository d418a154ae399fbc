//! Implementation of the `llmdeploy deploy` command.

use std::path::Path;

use anyhow::Context;
use llmdeploy_aws::{create_endpoint, hosting, EndpointRequest, EndpointType};

pub async fn run(config: Option<&Path>, endpoint_type: EndpointType) -> anyhow::Result<()> {
    let connector = hosting::connector()?;
    let settings = super::load_settings(config)?;

    let endpoint = create_endpoint(
        connector.as_ref(),
        &settings,
        EndpointRequest::from_settings(&settings, endpoint_type),
    )
    .await
    .context("deployment failed")?;

    let resources = endpoint.resources();
    println!("Deployment requested.");
    println!("  Endpoint:        {}", resources.endpoint_name);
    println!("  Endpoint config: {}", resources.endpoint_config_name);
    match &resources.model_name {
        Some(model) => println!("  Model:           {model}"),
        None => println!("  Model:           unchanged (existing endpoint configuration)"),
    }
    if let Some(component) = &resources.inference_component_name {
        println!("  Component:       {component}");
    }
    Ok(())
}
