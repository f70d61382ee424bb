use std::fs;
use std::path::PathBuf;

use qrstudio::{
    Color, EcLevel, ExportFormat, ModuleShape, QrContent, QrJob, QrStudioConfig, StyleOptions,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("qrstudio-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

// Environment variables are process-wide, so everything that touches them
// lives in this one test.
#[test]
fn env_overrides_layer_over_file_and_job() {
    let dir = scratch_dir("config");
    let config_path = dir.join("qrstudio.toml");
    fs::write(
        &config_path,
        r##"
[style]
foreground = "#222222"
ec_level = "m"
size = 600

[output]
directory = "renders"
file_stem = "card"
"##,
    )
    .expect("write config");

    let job_path = dir.join("job.yaml");
    fs::write(
        &job_path,
        r#"
content:
  type: wifi
  ssid: Cafe
  password: "a;b"
  encryption: WEP
style:
  pixel_style: dot
  size: 800
"#,
    )
    .expect("write job");

    unsafe {
        std::env::set_var("QRSTUDIO_EC_LEVEL", "q");
        std::env::set_var("QRSTUDIO_OUTPUT_FORMAT", "svg");
        std::env::set_var("QRSTUDIO_SIZE", "big");
        std::env::set_var("QRSTUDIO_MARGIN", "3");
    }
    let config = QrStudioConfig::load(Some(&config_path)).expect("load config");
    unsafe {
        std::env::remove_var("QRSTUDIO_EC_LEVEL");
        std::env::remove_var("QRSTUDIO_OUTPUT_FORMAT");
        std::env::remove_var("QRSTUDIO_SIZE");
        std::env::remove_var("QRSTUDIO_MARGIN");
    }

    assert_eq!(config.style.ec_level.as_deref(), Some("q"));
    // An unparseable size leaves the file's value in place.
    assert_eq!(config.style.size, Some(600));
    assert_eq!(config.style.margin, Some(3));
    assert_eq!(config.output.format, ExportFormat::Svg);
    assert_eq!(
        config.output.path_for(config.output.format),
        PathBuf::from("renders").join("card.svg")
    );

    let job = QrJob::from_file(&job_path).expect("load job");
    assert_eq!(job.content.to_payload(), r"WIFI:T:WEP;S:Cafe;P:a\;b;;");

    let cli = StyleOptions {
        corner_style: Some("round".to_string()),
        ..StyleOptions::default()
    };
    let options = config
        .style
        .merged_with(&job.style)
        .merged_with(&cli)
        .to_render_options()
        .expect("resolve options");

    assert_eq!(options.foreground, Color::rgb(0x22, 0x22, 0x22));
    assert_eq!(options.ec_level, EcLevel::Quartile);
    assert_eq!(options.pixel_style, ModuleShape::Dot);
    assert_eq!(options.corner_style, ModuleShape::Round);
    assert_eq!(options.size, 800);
    assert_eq!(options.margin, 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn job_without_style_uses_defaults() {
    let dir = scratch_dir("job");
    let job_path = dir.join("url.toml");
    fs::write(
        &job_path,
        r#"
[content]
type = "url"
url = "https://example.com"
"#,
    )
    .expect("write job");

    let job = QrJob::from_file(&job_path).expect("load job");
    assert_eq!(
        job.content,
        QrContent::Url {
            url: "https://example.com".to_string()
        }
    );
    assert_eq!(job.style, StyleOptions::default());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unsupported_job_extension_is_rejected() {
    let dir = scratch_dir("ext");
    let job_path = dir.join("job.json");
    fs::write(&job_path, "{}").expect("write job");

    assert!(QrJob::from_file(&job_path).is_err());

    let _ = fs::remove_dir_all(&dir);
}
