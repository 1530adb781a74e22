//! Crop a portrait and lay copies out on a print sheet.
//!
//! Usage:
//!   cargo run --example render_sheet -- <portrait> [photo-size] [paper] [copies]
//!
//! Defaults to an India passport photo, A4 paper and a full sheet. Writes a
//! 96 DPI preview and a 300 DPI print PNG next to the current directory.
//! Set `RUST_LOG=debug` to see the computed crop and grid.

use passphoto::{catalog, export_filename, OutputFormat, PassportPhoto, SheetSpec};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("usage: render_sheet <portrait> [photo-size] [paper] [copies]");
        std::process::exit(2);
    };
    let photo_id = args.next().unwrap_or_else(|| "india-passport".into());
    let paper_id = args.next().unwrap_or_else(|| "a4".into());

    let photo_size = catalog::photo_size(&photo_id)
        .unwrap_or_else(|| panic!("unknown photo size {photo_id}"));
    let paper = catalog::paper_layout(&paper_id)
        .unwrap_or_else(|| panic!("unknown paper layout {paper_id}"));

    let spec = SheetSpec::new(photo_size.size, paper.size);
    let capacity = spec.layout().unwrap().capacity();
    let copies = args
        .next()
        .map(|n| n.parse().expect("copies must be a number"))
        .unwrap_or(capacity);
    let spec = spec.copies(copies);

    let input = std::fs::read(&input_path).unwrap();
    let photo = PassportPhoto::new(&input)
        .unwrap()
        .aspect_ratio(photo_size.size.aspect_ratio())
        .auto_crop(true)
        .process()
        .unwrap();
    println!(
        "{}: cropped to {}x{} for {}",
        input_path,
        photo.width(),
        photo.height(),
        photo_size.name
    );

    for (tag, spec) in [("preview", spec.clone().preview()), ("print", spec.print())] {
        let sheet = spec.export(&photo).unwrap();
        let filename = format!(
            "{tag}-{}",
            export_filename(paper.name, sheet.placed, OutputFormat::Png)
        );
        std::fs::write(&filename, &sheet.data).unwrap();
        println!(
            "  {tag}: {filename} ({}x{}, {} of {} placed, {} bytes)",
            sheet.width,
            sheet.height,
            sheet.placed,
            capacity,
            sheet.data.len()
        );
    }
}
