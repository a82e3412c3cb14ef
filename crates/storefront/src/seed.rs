//! Built-in default collections.
//!
//! Seeds are written in the stored JSON shape and go through the same
//! normalizer as persisted data.

use olivo_market_core::normalize::{
    NormalizeContext, normalize_batch, normalize_category, normalize_order, normalize_product,
};
use olivo_market_core::{Category, Order, Product};
use serde_json::{Value, json};

/// The twelve products every fresh storefront starts with.
#[must_use]
pub fn products(ctx: &NormalizeContext) -> Vec<Product> {
    let raw = product_seed();
    normalize_batch(&raw, |p, _| normalize_product(p, ctx)).records
}

/// Default storefront categories.
#[must_use]
pub fn categories() -> Vec<Category> {
    let raw: Vec<Value> = [
        ("cat-bebidas", "Bebidas"),
        ("cat-panes", "Panes"),
        ("cat-viveres", "Víveres"),
        ("cat-helados", "Helados"),
        ("cat-quesos", "Quesos"),
        ("cat-cecinas", "Cecinas"),
        ("cat-mascotas", "Mascotas"),
        ("cat-higiene", "Higiene"),
        ("cat-aseo", "Aseo"),
        ("cat-venezolanos", "venezolanos"),
    ]
    .into_iter()
    .map(|(id, name)| json!({ "id": id, "name": name }))
    .collect();
    normalize_batch(&raw, |c, _| normalize_category(c)).records
}

/// Example orders for demos and support sessions.
#[must_use]
pub fn demo_orders(ctx: &NormalizeContext) -> Vec<Order> {
    let raw = demo_order_seed();
    normalize_batch(&raw, |o, position| normalize_order(o, position, ctx)).records
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: &str,
    name: &str,
    price: f64,
    price_original: f64,
    image: &str,
    description: &str,
    categories: &[&str],
    stock: u32,
    featured: bool,
) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "priceOriginal": price_original,
        "image": format!("https://images.unsplash.com/{image}?q=80&w=800&auto=format&fit=crop"),
        "description": description,
        "categories": categories,
        "stock": stock,
        "featured": featured,
        "createdAt": "2025-08-01",
        "viewCount": 0,
        "orderClicks": 0,
    })
}

#[allow(clippy::too_many_lines)]
fn product_seed() -> Vec<Value> {
    vec![
        product(
            "1",
            "Refresco Maltín Polar 355ml",
            1.7,
            1.9,
            "photo-1603398938378-e54eab446dde",
            "Bebida maltosa tradicional venezolana, bien fría sabe a hogar.",
            &["Bebidas", "venezolanos"],
            40,
            true,
        ),
        product(
            "2",
            "Harina P.A.N. Amarilla 1Kg",
            3.5,
            3.5,
            "photo-1601050690597-df0568f70950",
            "Harina precocida de maíz para tus arepas y cachapas. Calidad venezolana.",
            &["Víveres", "venezolanos"],
            60,
            true,
        ),
        product(
            "3",
            "Queso Llanero Semiduro 500g",
            6.2,
            6.9,
            "photo-1601004890684-d8cbf643f5f2",
            "Queso típico de los llanos, salado y perfecto para rallar o comer fresco.",
            &["Quesos"],
            25,
            true,
        ),
        product(
            "4",
            "Chorizo Ahumado Artesanal 300g",
            5.2,
            5.2,
            "photo-1603048722928-b735f0d47e1c",
            "Cecina ahumada con especias, ideal para parrillas y desayunos criollos.",
            &["Cecinas"],
            32,
            false,
        ),
        product(
            "5",
            "Pan Andino Dulce Unidad",
            1.2,
            1.2,
            "photo-1608198093002-ad4e005484ec",
            "Pan suave estilo andino con ligero dulzor, perfecto para el café.",
            &["Panes"],
            50,
            false,
        ),
        product(
            "6",
            "Helado de Coco Artesanal 1L",
            6.9,
            7.5,
            "photo-1563805042-7684c019e1cb",
            "Helado cremoso de coco estilo caribeño, refrescante y natural.",
            &["Helados"],
            18,
            true,
        ),
        product(
            "7",
            "Alimento Perro Adulto 2Kg",
            8.9,
            8.9,
            "photo-1513104890138-7c749659a591",
            "Nutrición balanceada para tu mascota, energía y salud diaria.",
            &["Mascotas"],
            22,
            false,
        ),
        product(
            "8",
            "Jabón Azul Tradicional 200g",
            1.4,
            1.4,
            "photo-1608219992759-8148ecd4d73e",
            "Clásico jabón multiuso para ropa y limpieza, aroma a nostalgia.",
            &["Aseo"],
            70,
            false,
        ),
        product(
            "9",
            "Shampoo Herbal Familiar 750ml",
            5.4,
            5.4,
            "photo-1601046233603-a4c2aee4c51f",
            "Fórmula con extractos naturales para uso diario de toda la familia.",
            &["Higiene"],
            30,
            false,
        ),
        product(
            "10",
            "Café Molido Oscuro 500g",
            6.2,
            6.2,
            "photo-1509042239860-f550ce710b93",
            "Café intenso de tueste oscuro, aroma profundo para comenzar el día.",
            &["Víveres"],
            26,
            true,
        ),
        product(
            "11",
            "Queso Guayanés Fresco 400g",
            7.1,
            7.1,
            "photo-1630383249896-831f33cbd1d5",
            "Queso suave, húmedo y elástico, perfecto para arepas y cachapas.",
            &["Quesos", "venezolanos"],
            15,
            false,
        ),
        product(
            "12",
            "Salchichón Tipo Campesino 250g",
            4.6,
            4.6,
            "photo-1601050690115-62df6aab2037",
            "Embutido de sabor tradicional para tapas y desayunos.",
            &["Cecinas"],
            28,
            false,
        ),
    ]
}

fn demo_order_seed() -> Vec<Value> {
    vec![
        json!({
            "id": "ORD-1723456789-123456",
            "date": "2025-08-15",
            "createdAt": "2025-08-15T10:30:00.000Z",
            "shippingCost": "10.00",
            "status": "Completado",
            "customer": "Juan Pérez González",
            "email": "juan.perez@example.com",
            "items": [
                {
                    "id": "harina-pan-1kg",
                    "name": "Harina P.A.N. 1kg",
                    "price": "45.99",
                    "quantity": 2,
                    "image": "/productos/harina-pan.jpg"
                },
                {
                    "id": "malta-polar-330ml",
                    "name": "Maltín Polar 330ml",
                    "price": "38.01",
                    "quantity": 1,
                    "image": "/productos/malta-polar.jpg"
                }
            ],
            "paymentMethod": "Tarjeta de Crédito",
            "transactionId": "TXN-1723456789",
            "shippingAddress": {
                "nombre": "Juan Pérez González",
                "calle": "Av. Insurgentes Sur",
                "numero": "1234",
                "interior": "Apt 5B",
                "ciudad": "Caracas",
                "estado": "Distrito Capital",
                "codigoPostal": "1060",
                "telefono": "555-123-4567"
            }
        }),
        json!({
            "id": "ORD-1723356789-789123",
            "date": "2025-08-14",
            "createdAt": "2025-08-14T15:20:00.000Z",
            "shippingCost": "10.00",
            "status": "En proceso",
            "customer": "María García",
            "email": "maria.garcia@example.com",
            "items": [
                {
                    "id": "queso-llanero-500g",
                    "name": "Queso Llanero 500g",
                    "price": "79.50",
                    "quantity": 1,
                    "image": "/productos/queso-llanero.jpg"
                }
            ],
            "paymentMethod": "Transferencia Bancaria",
            "transactionId": "TXN-1723356789"
        }),
        json!({
            "id": "ORD-1723256789-456789",
            "date": "2025-08-13",
            "createdAt": "2025-08-13T09:15:00.000Z",
            "shippingCost": "10.00",
            "status": "Enviado",
            "customer": "Carlos Rodríguez",
            "email": "carlos.rodriguez@example.com",
            "items": [
                {
                    "id": "cachito-jamon-queso",
                    "name": "Cachitos de Jamón y Queso (6 unidades)",
                    "price": "65.00",
                    "quantity": 2,
                    "image": "/productos/cachitos.jpg"
                },
                {
                    "id": "golfeados-dulce-papelon",
                    "name": "Golfeados con Dulce de Papelón (4 unidades)",
                    "price": "59.99",
                    "quantity": 1,
                    "image": "/productos/golfeados.jpg"
                }
            ],
            "paymentMethod": "Tarjeta de Débito",
            "transactionId": "TXN-1723256789"
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn ctx() -> NormalizeContext {
        NormalizeContext::at(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_product_seed_is_complete() {
        let products = products(&ctx());
        assert_eq!(products.len(), 12);
        let slugs: HashSet<_> = products.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs.len(), 12);
        assert_eq!(products[2].slug.as_str(), "queso-llanero-semiduro-500g");
        assert!(products[0].has_discount());
        assert!(products.iter().all(|p| p.view_count == 0 && p.order_clicks == 0));
    }

    #[test]
    fn test_category_seed() {
        let categories = categories();
        assert_eq!(categories.len(), 10);
        assert_eq!(categories[2].slug.as_str(), "viveres");
        assert!(categories.iter().all(|c| c.is_active));
    }

    #[test]
    fn test_demo_orders_are_consistent() {
        let orders = demo_orders(&ctx());
        assert_eq!(orders.len(), 3);
        assert!(orders.iter().all(Order::totals_consistent));
        assert_eq!(orders[2].total.to_string(), "199.99");
    }
}
