//! Debug CLI: run the parsing pipeline over a saved token dump (JSON array
//! of tokens) or, with the `tesseract` feature, a receipt image. Prints the
//! scan result as pretty JSON.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use resibo_core::ExpenseCategory;
use resibo_ocr::{categories_from_toml, parse_tokens, LineReconstructor, ScanResult, Token};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: resibo <tokens.json|image> [categories.toml]");
        return ExitCode::FAILURE;
    };

    let categories: Vec<ExpenseCategory> = match args.next() {
        Some(path) => {
            let content = std::fs::read_to_string(&path).expect("Failed to read categories file");
            categories_from_toml(&content).expect("Failed to parse categories file")
        }
        None => Vec::new(),
    };

    let path = Path::new(&input);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let result = if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        process_image(path, &categories)
    } else {
        let json = std::fs::read_to_string(path).expect("Failed to read tokens file");
        let tokens: Vec<Token> = serde_json::from_str(&json).expect("Failed to parse tokens JSON");
        parse_tokens(&tokens, &categories, &LineReconstructor::default())
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&result).expect("Failed to serialize result")
    );
    ExitCode::SUCCESS
}

#[cfg(feature = "tesseract")]
fn process_image(path: &Path, categories: &[ExpenseCategory]) -> ScanResult {
    use resibo_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    use resibo_ocr::ReceiptPipeline;

    let pipeline = ReceiptPipeline::new(TesseractRecognizer::new(None, "eng"));
    pipeline
        .process_file(path, categories)
        .expect("OCR pipeline failed")
}

#[cfg(not(feature = "tesseract"))]
fn process_image(path: &Path, _categories: &[ExpenseCategory]) -> ScanResult {
    eprintln!(
        "{}: image input requires the `tesseract` feature; pass a tokens JSON dump instead",
        path.display()
    );
    std::process::exit(2);
}
