fn main() {
    researchpilot_lib::run()
}
