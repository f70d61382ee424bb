use std::io::Cursor;
use std::path::PathBuf;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use qrstudio::payload::format_contact;
use qrstudio::{
    Color, ContactInfo, EcLevel, Error, ExportFormat, LogoSource, Pipeline, QrContent,
    RenderOptions, RenderRequest, SymbolVerifier, WifiCredential, WifiEncryption,
};

const LOGO_RED: Rgba<u8> = Rgba([0xe5, 0x39, 0x35, 0xff]);

fn solid_logo_png() -> Bytes {
    let logo = RgbaImage::from_pixel(64, 64, LOGO_RED);
    let mut buf = Vec::new();
    logo.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode logo");
    Bytes::from(buf)
}

fn contact() -> ContactInfo {
    ContactInfo {
        name: "Jane Doe".to_string(),
        phone: "+15551234567".to_string(),
        email: "jane@x.com".to_string(),
        organization: None,
        title: None,
    }
}

#[test]
fn contact_payload_is_vcard() {
    assert_eq!(
        format_contact(&contact()),
        "BEGIN:VCARD\nVERSION:3.0\nFN:Jane Doe\nTEL:+15551234567\nEMAIL:jane@x.com\nEND:VCARD"
    );
}

#[tokio::test]
async fn wifi_renders_at_default_size() {
    let request = RenderRequest::new(
        QrContent::Wifi(WifiCredential {
            ssid: "Home".to_string(),
            password: "secret1".to_string(),
            encryption: WifiEncryption::Wpa,
            hidden: false,
        }),
        RenderOptions::default(),
    );

    let rendered = Pipeline::new()
        .run(&request)
        .await
        .expect("render wifi")
        .expect("non-empty payload");

    assert_eq!(rendered.payload, "WIFI:T:WPA;S:Home;P:secret1;;");
    assert_eq!(rendered.size(), 1024);
    assert_eq!(rendered.ec_level, EcLevel::High);
    assert!(!rendered.has_logo);

    let decoded = SymbolVerifier::new()
        .decode(&DynamicImage::ImageRgba8(rendered.image.clone()))
        .expect("wifi symbol decodes");
    assert_eq!(decoded, "WIFI:T:WPA;S:Home;P:secret1;;");
}

#[tokio::test]
async fn logo_is_clipped_to_center_circle_and_still_scans() {
    let request = RenderRequest::new(
        QrContent::Url {
            url: "https://example.com".to_string(),
        },
        RenderOptions {
            logo: Some(LogoSource::Bytes(solid_logo_png())),
            ..RenderOptions::default()
        },
    );

    let rendered = Pipeline::new()
        .run(&request)
        .await
        .expect("render with logo")
        .expect("non-empty payload");

    assert!(rendered.has_logo);
    assert_eq!(*rendered.image.get_pixel(512, 512), LOGO_RED);
    assert_eq!(*rendered.image.get_pixel(512, 420), LOGO_RED);
    // Inside the logo's bounding square but outside the clip circle.
    assert_ne!(*rendered.image.get_pixel(412, 412), LOGO_RED);
    // Well outside the logo area.
    assert_ne!(*rendered.image.get_pixel(300, 512), LOGO_RED);

    SymbolVerifier::new()
        .verify(&rendered)
        .expect("high EC tolerates the logo");

    let svg = String::from_utf8(rendered.export(ExportFormat::Svg).expect("svg").to_vec())
        .expect("svg is utf-8");
    assert!(svg.contains("clip-path=\"url(#logo-clip)\""));
    assert!(svg.contains("data:image/png;base64,"));
}

#[tokio::test]
async fn missing_logo_fails_the_run() {
    let request = RenderRequest::new(
        QrContent::Text {
            text: "hello".to_string(),
        },
        RenderOptions {
            logo: Some(LogoSource::Path(PathBuf::from(
                "/nonexistent/qrstudio/logo.png",
            ))),
            ..RenderOptions::default()
        },
    );

    let err = Pipeline::new().run(&request).await.unwrap_err();
    assert!(matches!(err, Error::LogoLoad(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn undecodable_logo_fails_the_run() {
    let request = RenderRequest::new(
        QrContent::Text {
            text: "hello".to_string(),
        },
        RenderOptions {
            logo: Some(LogoSource::Bytes(Bytes::from_static(b"not an image"))),
            ..RenderOptions::default()
        },
    );

    let err = Pipeline::new().run(&request).await.unwrap_err();
    assert!(matches!(err, Error::LogoLoad(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn custom_colors_reach_the_bitmap() {
    let foreground = Color::parse("#1a237e").expect("color");
    let background = Color::parse("#fffde7").expect("color");
    let request = RenderRequest::new(
        QrContent::Contact(contact()),
        RenderOptions {
            foreground,
            background,
            size: 512,
            ..RenderOptions::default()
        },
    );

    let rendered = Pipeline::new()
        .run(&request)
        .await
        .expect("render contact")
        .expect("non-empty payload");

    // Quiet zone is background, the top-left finder's outer ring is foreground.
    assert_eq!(*rendered.image.get_pixel(0, 0), background.to_rgba());
    let total = (rendered.version * 4 + 17 + 2) as f64;
    let scale = 512.0 / total;
    let finder = (scale * 1.5) as u32;
    assert_eq!(*rendered.image.get_pixel(finder, finder), foreground.to_rgba());
}
