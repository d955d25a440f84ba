pub mod books;
pub mod recommendations;

use libris_kernel::ModuleRegistry;

use books::catalog::SharedCatalog;
use recommendations::client::Recommender;

/// Register all application modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    catalog: SharedCatalog,
    recommender: Recommender,
) {
    registry.register(books::create_module(catalog.clone()));
    registry.register(recommendations::create_module(recommender, catalog));
}
