use tracing::{debug, info};

use taskgrid_class::{ClassIdentifier, ClassLoader, FsClassLoader, TaskClass};
use taskgrid_core::ManagerConfig;

fn load(loader: &FsClassLoader, raw: &str) -> anyhow::Result<TaskClass> {
    let id = ClassIdentifier::parse(raw)?;
    let text = loader.load(&id)?;
    let class = TaskClass::from_yaml(id, &text)?;
    debug!(class = %class.identifier, bytes = text.len(), "class loaded");
    Ok(class)
}

fn quantity(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// One line per class; stops at the first class that fails.
pub fn validate(config: &ManagerConfig, classes: &[String]) -> anyhow::Result<()> {
    let loader = FsClassLoader::new(&config.repositories_path);

    for raw in classes {
        let class = load(&loader, raw)?;
        let ports = if class.wants.ports.is_empty() {
            "-".to_string()
        } else {
            class.wants.ports.to_string()
        };
        println!(
            "✓ {}  cpu={} memory={} ports={}",
            class.identifier,
            quantity(class.wants.cpu),
            quantity(class.wants.memory),
            ports
        );
    }

    info!(
        classes = classes.len(),
        repositories = %config.repositories_path.display(),
        "class definitions valid"
    );
    Ok(())
}

pub fn show(config: &ManagerConfig, class: &str) -> anyhow::Result<()> {
    let loader = FsClassLoader::new(&config.repositories_path);
    let class = load(&loader, class)?;
    println!("{}", serde_json::to_string_pretty(&class)?);
    Ok(())
}
