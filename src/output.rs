use serde::Serialize;
use serde_json::{json, Value};

pub fn output_data<T: Serialize>(data: &T, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string(data)?);
        }
        "yaml" => {
            print!("{}", serde_yaml::to_string(data)?);
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}

pub fn print_error(message: &str) {
    eprintln!("\x1b[31m❌ Error: {}\x1b[0m", message);
}

/// Document Ansible expects from a module that gathered facts.
pub fn module_success(result_key: &str, facts: Value) -> Value {
    let mut doc = serde_json::Map::new();
    doc.insert("changed".to_string(), Value::Bool(false));
    doc.insert(result_key.to_string(), facts);
    Value::Object(doc)
}

pub fn module_failure(message: &str) -> Value {
    json!({ "failed": true, "msg": message })
}

/// Ansible reads exactly one JSON document from stdout.
pub fn print_module_result(doc: &Value) {
    println!("{}", doc);
}
