//! # hx-md
//!
//! Huobi public market data over websocket.
//!
//! - [`huobi::codec`] — gzip inflate for inbound frames, JSON encode for requests
//! - [`huobi::protocol`] — subscribe request, kline tick and response envelope
//! - [`huobi::config`] — extraction of Huobi settings from the app config
//! - [`huobi::run`] — wires the frame handler into a [`hx_core::ws::WsSession`]

pub mod huobi;
