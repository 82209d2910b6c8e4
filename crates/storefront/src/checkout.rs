//! Checkout handoff: order message formatting and WhatsApp links.
//!
//! There is no payment step. Checkout renders the cart and shipping
//! address into a WhatsApp-formatted text message and hands the customer
//! a prefilled chat link to the store's contact number; the order is
//! confirmed in the conversation.

use kirana_core::Price;

use crate::address::ShippingAddress;
use crate::cart::CartLine;

/// Which WhatsApp entry point a link should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhatsappTarget {
    /// The `whatsapp://` app scheme for handheld devices.
    Mobile,
    /// The `web.whatsapp.com` endpoint for desktop browsers.
    Web,
}

/// A rendered order ready to hand to WhatsApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutHandoff {
    /// The plain-text order message.
    pub message: String,
    /// Prefilled chat link using the app scheme.
    pub mobile_url: String,
    /// Prefilled chat link using the web endpoint.
    pub web_url: String,
}

/// Render the order message.
///
/// The total is recomputed here from the lines rather than passed in, so
/// the message can never disagree with the cart it lists. Product links
/// point at `{base_url}/product/{id}`.
#[must_use]
pub fn format_order_message(
    lines: &[CartLine],
    address: &ShippingAddress,
    unlocked_rewards: &[String],
    base_url: &str,
) -> String {
    let mut message = String::from("🌟 *MY ORDER DETAILS* 🌟\n\n");

    message.push_str("🛒 *ITEMS ORDERED:*\n");
    for (index, line) in lines.iter().enumerate() {
        let product_link = format!("{base_url}/product/{}", line.id);
        message.push_str(&format!(
            "*{}. {}* 🔗 [View Product]({product_link})\n",
            index + 1,
            line.name
        ));
        message.push_str(&format!("   └ 📦 Qty: {}\n", line.quantity));
        message.push_str(&format!("   └ 💵 Price: {}\n", line.price));
        message.push_str(&format!("   └ 💰 Subtotal: {}\n\n", line.line_subtotal()));
    }

    let total: Price = lines.iter().map(CartLine::line_subtotal).sum();
    message.push_str("——————————————\n");
    message.push_str(&format!("💳 *TOTAL AMOUNT: {total}*\n\n"));

    message.push_str("🏡 *SHIPPING ADDRESS:*\n");
    message.push_str(&format!("👤 *Name:* {}\n", address.name));
    message.push_str(&format!(
        "📍 *Address:* {}, {}\n",
        address.street, address.city
    ));
    message.push_str(&format!(
        "🏙️ *State:* {} ({})\n",
        address.state, address.pincode
    ));
    message.push_str(&format!("📞 *Phone:* {}\n\n", address.phone));

    if !unlocked_rewards.is_empty() {
        message.push_str("🎁 *UNLOCKED REWARDS:*\n");
        for label in unlocked_rewards {
            message.push_str(&format!("   └ 🎉 {label}\n"));
        }
        message.push('\n');
    }

    message.push_str("📢 *Please confirm my order and let me know the expected delivery date.*\n");
    message.push_str("🙏 *Looking forward to receiving my order!* ❤️");

    message
}

/// Build a prefilled WhatsApp chat link to the store's contact number.
#[must_use]
pub fn whatsapp_url(contact_phone: &str, message: &str, target: WhatsappTarget) -> String {
    let encoded = urlencoding::encode(message);
    match target {
        WhatsappTarget::Mobile => {
            format!("whatsapp://send?phone={contact_phone}&text={encoded}")
        }
        WhatsappTarget::Web => {
            format!("https://web.whatsapp.com/send?phone={contact_phone}&text={encoded}")
        }
    }
}
