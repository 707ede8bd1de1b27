fn main() {
    dispatchq::app::startup::startup();
}
