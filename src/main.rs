use eframe::egui;
use uml_loom::config::settings::AppSettings;
use uml_loom::gui::frontend::DiagramApp;

fn main() -> eframe::Result {
    env_logger::init();
    let settings = AppSettings::load().unwrap_or_else(|e| {
        log::warn!("could not load settings, using defaults: {e:#}");
        AppSettings::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 710.0])
            // Provide sensible bounds so the UI stays usable on small screens
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "UML-Loom",
        options,
        Box::new(move |_cc| Ok(Box::new(DiagramApp::new(settings)) as Box<dyn eframe::App>)),
    )
}
