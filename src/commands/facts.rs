use crate::cli::VcenterArgs;
use crate::config::{ConnectionConfig, ConnectionOverrides, FileConfig, Secret};
use crate::facts::{collect_from_vcenter, FactKind};
use crate::output::output_data;

pub fn handle_facts_command(
    kind: FactKind,
    args: &VcenterArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = FileConfig::discover(args.config.as_deref())?;
    let config = ConnectionConfig::resolve(overrides_from(args), file)?;

    let facts = collect_from_vcenter(&config, kind)?;
    output_data(&facts, &args.format)?;
    Ok(())
}

fn overrides_from(args: &VcenterArgs) -> ConnectionOverrides {
    ConnectionOverrides {
        vcenter: args.vcenter.clone(),
        username: args.username.clone(),
        password: args.password.clone().map(Secret::from),
        disable_ssl_verification: args.disable_ssl_verification,
        timeout_secs: args.timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_fill_gaps_left_by_config_file() {
        let args = VcenterArgs {
            vcenter: None,
            username: Some("ops".to_string()),
            password: Some("s3cret".to_string()),
            disable_ssl_verification: false,
            timeout: Some(5),
            config: None,
            format: "json".to_string(),
        };
        let file = FileConfig::parse("vcenter: vc01.lab\nusername: ignored\n").unwrap();

        let config = ConnectionConfig::resolve(overrides_from(&args), file).unwrap();
        assert_eq!(config.endpoint, "vc01.lab");
        assert_eq!(config.username, "ops");
        assert_eq!(config.secret.expose(), "s3cret");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.verify_tls);
    }
}
