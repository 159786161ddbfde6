#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod app;
mod camera;
mod compositor;
mod config;
mod dialog;
mod export;
mod geometry;
mod profile;
mod transform;
mod viewer;

use app::SnapcropApp;
use egui::{Vec2, ViewportBuilder};
use env_logger::Env;
use log::LevelFilter;

const APP_TITLE: &str = "SNAPCROP";

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("eframe", LevelFilter::Off)
        .filter_module("wgpu", LevelFilter::Off)
        .filter_module("naga", LevelFilter::Off)
        .filter_module("egui_wgpu", LevelFilter::Off)
        .init();

    let options: eframe::NativeOptions = eframe::NativeOptions {
        renderer: eframe::Renderer::Wgpu,
        viewport: ViewportBuilder {
            transparent: Some(false),
            fullscreen: Some(false),
            title: Some(APP_TITLE.to_string()),
            min_inner_size: Some(Vec2::new(720.0, 560.0)),
            ..Default::default()
        },
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc: &eframe::CreationContext<'_>| Ok(Box::new(SnapcropApp::new(cc)))),
    )
    .expect("Failed to run SnapcropApp");
}
