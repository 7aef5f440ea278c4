use crate::domain::order::Order;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRow<'a> {
    order: String,
    buyer: &'a str,
    status: &'static str,
    // Space-separated ids; `-` for a line supplied without one.
    products: String,
    amount: String,
    transaction: &'a str,
    created_at: String,
}

impl<'a> From<&'a Order> for OrderRow<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            order: order.id.to_string(),
            buyer: &order.buyer.0,
            status: order.status.as_str(),
            products: order
                .products
                .iter()
                .map(|line| line.product_id.as_ref().map_or("-", |id| id.0.as_str()))
                .collect::<Vec<_>>()
                .join(" "),
            amount: order.payment.amount.to_string(),
            transaction: &order.payment.id,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Writes an order report as CSV, one row per order.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    /// Emits the header even when there are no orders.
    pub fn write_orders<'a, I>(&mut self, orders: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Order>,
    {
        self.writer.write_record([
            "order",
            "buyer",
            "status",
            "products",
            "amount",
            "transaction",
            "created_at",
        ])?;
        for order in orders {
            self.writer.serialize(OrderRow::from(order))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
