#![allow(dead_code)]

pub mod scripted;
pub mod site_server;
