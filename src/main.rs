use eframe::egui;
use label_submit::app::LabelApp;
use std::path::PathBuf;

const USAGE: &str = "Usage: label-submit [image] [--classes '[\"name\",...]'] [--endpoint URL]";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut image_path: Option<PathBuf> = None;
    let mut classes_json: Option<String> = None;
    let mut endpoint: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--classes" => classes_json = args.next(),
            "--endpoint" => endpoint = args.next(),
            "--help" | "-h" => {
                eprintln!("{USAGE}");
                return;
            }
            _ => image_path = Some(PathBuf::from(arg)),
        }
    }

    // Known class names arrive as a JSON-encoded string array, possibly empty.
    let classes: Vec<String> = match classes_json {
        Some(json) => match serde_json::from_str(&json) {
            Ok(classes) => classes,
            Err(e) => {
                eprintln!("Invalid --classes value: {e}\n{USAGE}");
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };

    let endpoint = endpoint
        .or_else(|| std::env::var("API_ENDPOINT").ok())
        .unwrap_or_else(|| "http://localhost:8000".to_string());

    let image_path = image_path.or_else(|| {
        rfd::FileDialog::new()
            .add_filter("images", &["png", "jpg", "jpeg", "bmp", "gif"])
            .pick_file()
    });
    let Some(image_path) = image_path else {
        eprintln!("No image selected.\n{USAGE}");
        std::process::exit(1);
    };
    if !image_path.exists() {
        eprintln!("File not found: {}", image_path.display());
        std::process::exit(1);
    }

    log::info!("annotating {} against {endpoint}", image_path.display());

    let title = format!(
        "label-submit — {}",
        image_path
            .file_name()
            .unwrap_or_default()
            .to_str()
            .unwrap_or("")
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(LabelApp::new(image_path, classes, endpoint)))),
    )
    .expect("Failed to run eframe");
}
