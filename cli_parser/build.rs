// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    input: InputLimits,
    engine: EngineLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct InputLimits {
    max_input_length: usize,
}

#[derive(serde::Deserialize)]
struct EngineLimits {
    max_stack_depth: usize,
    dispatch_table_size: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CLI_PARSER_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=CLI_PARSER_CONFIG_DIR");

    let profile =
        env::var("CLI_PARSER_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("CLI_PARSER_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the cli_parser directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_INPUT_LENGTH: usize = 16 * 1024 * 1024;
    const ABSOLUTE_MAX_STACK_DEPTH: usize = 1_000_000;

    if config.input.max_input_length == 0
        || config.input.max_input_length > ABSOLUTE_MAX_INPUT_LENGTH
    {
        panic!("LIMITS: max_input_length must be between 1 and {ABSOLUTE_MAX_INPUT_LENGTH}");
    }

    if config.engine.max_stack_depth < 16 || config.engine.max_stack_depth > ABSOLUTE_MAX_STACK_DEPTH
    {
        panic!("LIMITS: max_stack_depth must be between 16 and {ABSOLUTE_MAX_STACK_DEPTH}");
    }

    // The dense table must at least cover every grammar character
    if config.engine.dispatch_table_size < 128 || config.engine.dispatch_table_size > 65_536 {
        panic!("LIMITS: dispatch_table_size must be between 128 and 65536");
    }

    if profile == "production" && config.engine.max_stack_depth > 4096 {
        panic!("PRODUCTION: max_stack_depth too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod input {{
        pub const MAX_INPUT_LENGTH: usize = {};
    }}

    pub mod engine {{
        pub const MAX_STACK_DEPTH: usize = {};
        pub const DISPATCH_TABLE_SIZE: usize = {};
    }}

    pub mod logging {{
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        config.input.max_input_length,
        config.engine.max_stack_depth,
        config.engine.dispatch_table_size,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
