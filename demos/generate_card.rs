//! Generate a contact QR code with a centered logo, as PNG and SVG
//!
//! Usage: cargo run --example generate_card

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use qrstudio::{
    Color, ContactInfo, EcLevel, ExportFormat, LogoSource, ModuleShape, Pipeline, QrContent,
    RenderOptions, RenderRequest, SymbolVerifier,
};
use std::io::Cursor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // A simple two-tone logo drawn in memory
    let logo = RgbaImage::from_fn(128, 128, |x, _| {
        if x < 64 {
            Rgba([0x1e, 0x88, 0xe5, 0xff])
        } else {
            Rgba([0xff, 0xb3, 0x00, 0xff])
        }
    });
    let mut logo_png = Vec::new();
    logo.write_to(&mut Cursor::new(&mut logo_png), ImageFormat::Png)?;

    let content = QrContent::Contact(ContactInfo {
        name: "Jane Doe".to_string(),
        phone: "+1 555 0100".to_string(),
        email: "jane@example.com".to_string(),
        organization: Some("Example Corp".to_string()),
        title: None,
    });

    let options = RenderOptions {
        foreground: Color::parse("#1a237e")?,
        ec_level: EcLevel::High,
        corner_style: ModuleShape::Round,
        pixel_style: ModuleShape::Dot,
        logo: Some(LogoSource::Bytes(Bytes::from(logo_png))),
        ..RenderOptions::default()
    };

    let request = RenderRequest::new(content, options);
    let Some(rendered) = Pipeline::new().run(&request).await? else {
        println!("Nothing to render");
        return Ok(());
    };

    std::fs::write("card.png", rendered.export(ExportFormat::Png)?)?;
    std::fs::write("card.svg", rendered.export(ExportFormat::Svg)?)?;
    println!("✓ Contact QR code saved to card.png and card.svg");
    println!("  Version {}, {} byte payload", rendered.version, rendered.payload.len());

    match SymbolVerifier::new().verify(&rendered) {
        Ok(()) => println!("✓ Symbol decodes back to the vCard payload"),
        Err(err) => println!("✗ Verification failed: {err}"),
    }

    Ok(())
}
