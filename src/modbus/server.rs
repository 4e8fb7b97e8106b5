//! # Modbus TCP Server
//!
//! Emulates Janitza UMG 96RM meters over Modbus TCP. Each configured unit
//! id serves one meter; holding and input registers both read from the
//! same window, and every read pulls a fresh reading through the
//! caller-supplied provider so clients always see the live simulation.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use tokio_modbus::prelude::*;
use tokio_modbus::server::Service;
use tokio_modbus::{ExceptionCode, SlaveRequest};
use tracing::{debug, info, warn};

use crate::domain::MeterReading;
use crate::error::{Result as SimResult, SimulationError};
use crate::modbus::registers::{build_register_window, is_valid_read};

/// Resolves a meter id to its current reading. `None` means the meter is
/// unknown or currently unavailable; affected reads return zeros.
pub type MeterReadingProvider = Arc<dyn Fn(&str) -> Option<MeterReading> + Send + Sync>;

/// Janitza meter emulation behind one TCP listener.
#[derive(Clone)]
pub struct JanitzaService {
    /// Unit id to meter id.
    units: Arc<HashMap<u8, String>>,
    provider: MeterReadingProvider,
}

impl JanitzaService {
    pub fn new(units: HashMap<u8, String>, provider: MeterReadingProvider) -> SimResult<Self> {
        for unit_id in units.keys() {
            if !(1..=247).contains(unit_id) {
                return Err(SimulationError::InvalidUnitId(*unit_id));
            }
        }
        Ok(Self {
            units: Arc::new(units),
            provider,
        })
    }

    pub fn registered_units(&self) -> &HashMap<u8, String> {
        &self.units
    }

    /// Serve a register read against a fresh window for the unit's meter.
    pub fn read_registers(
        &self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, ExceptionCode> {
        let Some(meter_id) = self.units.get(&unit_id) else {
            warn!(unit_id, "read for unregistered unit id");
            return Err(ExceptionCode::GatewayTargetDevice);
        };
        if !is_valid_read(address, count) {
            return Err(ExceptionCode::IllegalDataAddress);
        }

        let window = match (self.provider)(meter_id) {
            Some(reading) => build_register_window(&reading),
            None => {
                warn!(%meter_id, "no reading available, serving zeros");
                HashMap::new()
            }
        };

        let words: Vec<u16> = (0..count)
            .map(|offset| window.get(&(address + offset)).copied().unwrap_or(0))
            .collect();
        debug!(unit_id, %meter_id, address, count, "served register read");
        Ok(words)
    }
}

impl Service for JanitzaService {
    type Request = SlaveRequest<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Exception>> + Send + Sync>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        let service = self.clone();
        let unit_id = req.slave;

        Box::pin(async move {
            match req.request {
                Request::ReadHoldingRegisters(address, count) => service
                    .read_registers(unit_id, address, count)
                    .map(Response::ReadHoldingRegisters),
                Request::ReadInputRegisters(address, count) => service
                    .read_registers(unit_id, address, count)
                    .map(Response::ReadInputRegisters),
                _ => Err(ExceptionCode::IllegalFunction),
            }
        })
    }
}

/// Bind and serve until the task is aborted.
pub async fn run_server(
    addr: SocketAddr,
    units: HashMap<u8, String>,
    provider: MeterReadingProvider,
) -> anyhow::Result<()> {
    let service = JanitzaService::new(units, provider)?;
    info!(
        %addr,
        units = service.registered_units().len(),
        "starting Modbus TCP server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = tokio_modbus::server::tcp::Server::new(listener);

    let on_connected = move |socket, _addr| {
        let service = service.clone();
        async move { Ok::<_, std::io::Error>(Some((service, socket))) }
    };

    server
        .serve(&on_connected, |err| {
            warn!(error = ?err, "Modbus server error");
        })
        .await?;

    Ok(())
}
