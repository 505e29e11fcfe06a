pub mod normalizer;
pub mod workbook_writer;
pub mod drive;
pub mod uploader;

pub mod webhook_service;
