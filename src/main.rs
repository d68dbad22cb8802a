fn main() -> Result<(), Box<dyn std::error::Error>> {
    encore::runtime::run()
}
