// Сценарные тесты: полный проход по языку и пересинхронизация файлов

mod test_realign;
