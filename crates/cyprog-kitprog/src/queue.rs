//! Queued SWD transaction batching
//!
//! The KitProg firmware accepts a packet of back to back SWD requests
//! on the bulk OUT endpoint and answers with one packet holding, for
//! every request, its data bytes (reads only, little endian, first)
//! followed by a single ack byte. The firmware never sends a zero
//! length packet; short results are padded, and some revisions prepend
//! garbage which is skipped by lining the tail of the response up with
//! the expected byte count.

use cyprog_core::{Error, Port, ReadSlot, Result, SwdRequest};
use log::{debug, trace};

use crate::transport::Transport;

struct PendingTransfer {
    request: SwdRequest,
    data: u32,
    slot: Option<ReadSlot>,
}

/// Host side queue of SWD register accesses
///
/// Accesses pile up until [`TransferQueue::run`] is called or the queue
/// fills, whichever comes first. A failed flush is sticky: everything
/// queued afterwards is dropped and the error is reported by the next
/// `run`, which also clears it.
pub struct TransferQueue {
    pending: Vec<PendingTransfer>,
    capacity: usize,
    packet_size: usize,
    sticky: Option<Error>,
}

impl TransferQueue {
    /// A queue sized for the given bulk packet size
    ///
    /// Worst case each request occupies five outgoing bytes (header plus
    /// write data), which bounds how many fit in one packet.
    pub fn new(packet_size: usize) -> Self {
        Self {
            pending: Vec::with_capacity(packet_size / 5),
            capacity: packet_size / 5,
            packet_size,
            sticky: None,
        }
    }

    /// Queue a register read; the slot is filled when the queue runs
    pub fn queue_read<T: Transport>(&mut self, transport: &mut T, port: Port, addr: u8) -> ReadSlot {
        let slot = ReadSlot::new();
        self.queue(
            transport,
            SwdRequest::read(port, addr),
            0,
            Some(slot.clone()),
        );
        slot
    }

    /// Queue a register write
    pub fn queue_write<T: Transport>(&mut self, transport: &mut T, port: Port, addr: u8, value: u32) {
        self.queue(transport, SwdRequest::write(port, addr), value, None);
    }

    fn queue<T: Transport>(
        &mut self,
        transport: &mut T,
        request: SwdRequest,
        data: u32,
        slot: Option<ReadSlot>,
    ) {
        if self.pending.len() == self.capacity {
            // Not enough room in the queue. Run the queue.
            if let Err(e) = self.run(transport) {
                self.sticky = Some(e);
            }
        }

        if self.sticky.is_some() {
            trace!("dropping {} after earlier queue failure", request);
            return;
        }

        self.pending.push(PendingTransfer {
            request,
            data,
            slot,
        });
    }

    /// Flush the queue and report the outcome of the whole batch
    pub fn run<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        let result = match self.sticky.take() {
            Some(e) => {
                debug!("skipping flush due to previous error: {}", e);
                Err(e)
            }
            None if self.pending.is_empty() => Ok(()),
            None => {
                debug!("executing {} queued transactions", self.pending.len());
                self.flush(transport)
            }
        };

        self.pending.clear();
        result
    }

    fn flush<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        let mut packet = Vec::with_capacity(self.packet_size);
        let mut read_count = 0usize;

        for transfer in &self.pending {
            packet.push(transfer.request.bits());
            read_count += 1;
            if transfer.request.is_read() {
                read_count += 4;
            } else {
                packet.extend_from_slice(&transfer.data.to_le_bytes());
            }
        }

        transport
            .bulk_write(&packet)
            .map_err(|_| Error::TransportFailure)?;

        // Always request a full packet; the firmware dislikes short
        // bulk reads and pads the data instead of sending ZLPs.
        let mut response = vec![0u8; self.packet_size];
        let returned = transport
            .bulk_read(&mut response)
            .map_err(|_| Error::TransportFailure)?;

        if returned == 0 {
            return Err(Error::TransportFailure);
        }
        if returned < read_count {
            return Err(Error::QueueDesync);
        }
        // Garbage data at the head is skipped by starting the walk at
        // the offset that leaves exactly read_count bytes
        let mut read_index = returned - read_count;

        for transfer in &self.pending {
            if transfer.request.is_read() {
                let end = read_index + 4;
                let bytes: [u8; 4] = response[read_index..end]
                    .try_into()
                    .map_err(|_| Error::QueueDesync)?;
                let value = u32::from_le_bytes(bytes);
                trace!("{} = 0x{:08x}", transfer.request, value);
                if let Some(slot) = &transfer.slot {
                    slot.set(value);
                }
                read_index = end;
            }
            // ack byte
            read_index += 1;
        }

        Ok(())
    }
}
