fn main() {
    // ESP-IDF environment (linker args, sdkconfig) only matters for device builds.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
