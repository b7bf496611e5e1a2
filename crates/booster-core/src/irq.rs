//! Interrupt dispatch
//!
//! The USB stack is the only interrupt source the updater enables. Its
//! handler eventually marks the upload window ready; nothing else in the
//! updater runs from interrupt context.

/// Forward a pending interrupt to the USB handler
///
/// `pending` and `enabled` are the raw pending and mask registers; the
/// handler runs only if `usb_line` is set in both. Returns whether it ran.
pub fn dispatch<H: FnOnce()>(pending: u32, enabled: u32, usb_line: u32, usb_isr: H) -> bool {
    let irqs = pending & enabled;
    let usb_bit = 1u32.checked_shl(usb_line).unwrap_or(0);
    if irqs & usb_bit == 0 {
        return false;
    }
    usb_isr();
    true
}
