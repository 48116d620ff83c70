pub mod cart;
pub mod cart_item;
pub mod category;
pub mod client;
pub mod order;
pub mod order_item;
pub mod product;
pub mod quotation;
pub mod quotation_item;
pub mod supplier;

// Re-export entities under their business names
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use client::{Entity as Client, Model as ClientModel};
pub use order::{Entity as Order, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use quotation::{Entity as Quotation, Model as QuotationModel};
pub use quotation_item::{Entity as QuotationItem, Model as QuotationItemModel};
pub use supplier::{Entity as Supplier, Model as SupplierModel};
