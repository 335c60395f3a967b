//! State document model
//!
//! Terraform has persisted state in two structurally different layouts: a
//! nested `"modules"` list (state versions up to 3) and a flat top-level
//! `"resources"`/`"outputs"` layout (state version 4). Both normalize here
//! into one module tree at parse time, so accessors never have to probe for
//! the shape.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::DomainError;

/// Path of a module within the state tree. The empty path is the root module.
pub type ModulePath = Vec<String>;

/// Render a module path as an address prefix (`root`, `module.a.module.b`).
pub fn render_module_path(path: &[String]) -> String {
    if path.is_empty() {
        "root".to_string()
    } else {
        path.iter()
            .map(|segment| format!("module.{segment}"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// One managed resource with its per-instance attribute maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    /// Resource type, e.g. `aws_instance`
    pub kind: String,
    /// Resource name within its module
    pub name: String,
    /// Attribute map per instance (one entry unless `count`/`for_each` apply)
    pub instances: Vec<serde_json::Map<String, Value>>,
}

/// A named scope grouping resources and outputs.
///
/// Resource and output names are unique within their owning module; the
/// maps enforce that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    /// Resources keyed by address within the module (`type.name`)
    pub resources: BTreeMap<String, Resource>,
    /// Output name to value
    pub outputs: BTreeMap<String, Value>,
}

/// Parsed, normalized state document.
///
/// Reconstructed from scratch on every parse; never mutated in place. The
/// default value is the empty document (version 0, zero modules), which is
/// what an unprovisioned working directory reads as.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDocument {
    pub version: u64,
    pub modules: BTreeMap<ModulePath, Module>,
}

impl StateDocument {
    /// Normalize a parsed JSON document into the module tree.
    ///
    /// A `"modules"` list selects the nested layout; anything else is read
    /// as the flat layout (top-level `"resources"` list and `"outputs"`
    /// map, both optional).
    pub fn from_value(root: &Value) -> Result<Self, DomainError> {
        let obj = root
            .as_object()
            .ok_or_else(|| DomainError::MalformedState("top level is not an object".into()))?;
        let version = obj.get("version").and_then(Value::as_u64).unwrap_or(0);

        let mut modules: BTreeMap<ModulePath, Module> = BTreeMap::new();

        if let Some(list) = obj.get("modules").and_then(Value::as_array) {
            for entry in list {
                normalize_nested_module(entry, &mut modules)?;
            }
        } else {
            if let Some(outputs) = obj.get("outputs").and_then(Value::as_object) {
                let root_module = modules.entry(ModulePath::new()).or_default();
                for (name, value) in outputs {
                    root_module
                        .outputs
                        .insert(name.clone(), unwrap_output_value(value));
                }
            }
            if let Some(resources) = obj.get("resources").and_then(Value::as_array) {
                for resource in resources {
                    normalize_flat_resource(resource, &mut modules)?;
                }
            }
        }

        Ok(Self { version, modules })
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Look up a root-module output by name.
    pub fn output(&self, name: &str) -> Result<&Value, DomainError> {
        self.output_in(&[], name)
    }

    /// Look up an output by name within the module at `path`.
    pub fn output_in(&self, path: &[String], name: &str) -> Result<&Value, DomainError> {
        self.modules
            .get(path)
            .and_then(|module| module.outputs.get(name))
            .ok_or_else(|| DomainError::OutputNotFound {
                name: name.to_string(),
                module: render_module_path(path),
            })
    }

    /// All resource addresses, module-qualified, in deterministic order.
    pub fn resource_addresses(&self) -> Vec<String> {
        let mut addresses = Vec::new();
        for (path, module) in &self.modules {
            for addr in module.resources.keys() {
                if path.is_empty() {
                    addresses.push(addr.clone());
                } else {
                    addresses.push(format!("{}.{}", render_module_path(path), addr));
                }
            }
        }
        addresses
    }

    /// All module paths present in the document.
    pub fn module_paths(&self) -> Vec<ModulePath> {
        self.modules.keys().cloned().collect()
    }
}

/// Fold one entry of the nested `"modules"` list into the tree.
///
/// The legacy root module is spelled `["root"]`; the leading segment is
/// stripped so the root lands on the empty path.
fn normalize_nested_module(
    entry: &Value,
    modules: &mut BTreeMap<ModulePath, Module>,
) -> Result<(), DomainError> {
    let obj = entry
        .as_object()
        .ok_or_else(|| DomainError::MalformedState("module entry is not an object".into()))?;

    let mut path: ModulePath = match obj.get("path") {
        Some(Value::Array(segments)) => segments
            .iter()
            .map(|s| {
                s.as_str().map(str::to_string).ok_or_else(|| {
                    DomainError::MalformedState("module path segment is not a string".into())
                })
            })
            .collect::<Result<_, _>>()?,
        None => ModulePath::new(),
        Some(_) => {
            return Err(DomainError::MalformedState(
                "module path is not an array".into(),
            ))
        }
    };
    if path.first().map(String::as_str) == Some("root") {
        path.remove(0);
    }

    let module = modules.entry(path).or_default();

    if let Some(outputs) = obj.get("outputs").and_then(Value::as_object) {
        for (name, value) in outputs {
            module.outputs.insert(name.clone(), unwrap_output_value(value));
        }
    }

    if let Some(resources) = obj.get("resources").and_then(Value::as_object) {
        for (address, body) in resources {
            let (kind, name) = split_resource_address(address, body);
            let mut instances = Vec::new();
            if let Some(attributes) = body
                .get("primary")
                .and_then(|primary| primary.get("attributes"))
                .and_then(Value::as_object)
            {
                instances.push(attributes.clone());
            }
            module.resources.insert(
                address.clone(),
                Resource {
                    kind,
                    name,
                    instances,
                },
            );
        }
    }

    Ok(())
}

/// Fold one entry of the flat `"resources"` list into the tree.
fn normalize_flat_resource(
    entry: &Value,
    modules: &mut BTreeMap<ModulePath, Module>,
) -> Result<(), DomainError> {
    let obj = entry
        .as_object()
        .ok_or_else(|| DomainError::MalformedState("resource entry is not an object".into()))?;

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::MalformedState("resource entry has no type".into()))?
        .to_string();
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::MalformedState("resource entry has no name".into()))?
        .to_string();

    let path = match obj.get("module").and_then(Value::as_str) {
        Some(address) => parse_module_address(address)?,
        None => ModulePath::new(),
    };

    let address = match obj.get("mode").and_then(Value::as_str) {
        Some("data") => format!("data.{kind}.{name}"),
        _ => format!("{kind}.{name}"),
    };

    let instances: Vec<_> = obj
        .get("instances")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|instance| {
                    instance
                        .get("attributes")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();

    let module = modules.entry(path).or_default();
    let resource = module.resources.entry(address).or_insert_with(|| Resource {
        kind,
        name,
        instances: Vec::new(),
    });
    resource.instances.extend(instances);

    Ok(())
}

/// Parse a flat-layout module address (`module.a.module.b`) into a path.
///
/// Instance keys on a segment (`module.a[0]`) are dropped; the tree is keyed
/// by module name.
fn parse_module_address(address: &str) -> Result<ModulePath, DomainError> {
    let mut segments = address.split('.');
    let mut path = ModulePath::new();
    while let Some(keyword) = segments.next() {
        if keyword != "module" {
            return Err(DomainError::MalformedState(format!(
                "invalid module address: {address}"
            )));
        }
        let segment = segments.next().ok_or_else(|| {
            DomainError::MalformedState(format!("invalid module address: {address}"))
        })?;
        let segment = segment.split('[').next().unwrap_or(segment);
        path.push(segment.to_string());
    }
    Ok(path)
}

/// Split a legacy resource address (`aws_instance.web`, possibly with a
/// count suffix) into type and name, preferring the entry's own `type` field.
fn split_resource_address(address: &str, body: &Value) -> (String, String) {
    if let Some(kind) = body.get("type").and_then(Value::as_str) {
        let name = address
            .strip_prefix(kind)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(address);
        return (kind.to_string(), name.to_string());
    }
    match address.split_once('.') {
        Some((kind, name)) => (kind.to_string(), name.to_string()),
        None => (address.to_string(), String::new()),
    }
}

/// Legacy outputs may be bare scalars or `{"value": ...}` wrappers; both
/// normalize to the bare value.
fn unwrap_output_value(value: &Value) -> Value {
    match value.as_object().and_then(|obj| obj.get("value")) {
        Some(inner) => inner.clone(),
        None => value.clone(),
    }
}
